//! The runtime chunk.
//!
//! Every page loads `js/runtime.[hash].js` first. It owns the module registry,
//! evaluates modules on first `__satchel_require__`, and installs chunks pushed
//! onto `self.satchelChunks` in whatever order the browser runs them. An entry
//! module executes once all chunks it lists are installed.
//!
//! Chunk record format:
//!
//! ```text
//! [ [chunk names], { "module id": factory, ... }, [ [entry id, required chunk names...], ... ] ]
//! ```
//!
//! The source is a constant; it never mentions a module id or chunk hash, so
//! its hash only changes with this file.

/// Name of the module loader function inside factories.
pub const REQUIRE: &str = "__satchel_require__";

/// Global array chunks push themselves onto.
pub const CHUNK_QUEUE: &str = "self.satchelChunks";

/// Manifest key of the runtime chunk.
pub const RUNTIME_NAME: &str = "runtime.js";

pub const RUNTIME_SOURCE: &str = r#"(function () {
  "use strict";
  var hasOwn = Object.prototype.hasOwnProperty;
  var modules = {};
  var cache = {};
  var installedChunks = {};
  var deferred = [];

  function __satchel_require__(id) {
    var cached = cache[id];
    if (cached !== undefined) return cached.exports;
    var factory = modules[id];
    if (factory === undefined) {
      var err = new Error("Cannot find module '" + id + "'");
      err.code = "MODULE_NOT_FOUND";
      throw err;
    }
    var module = (cache[id] = { id: id, exports: {} });
    factory.call(module.exports, module, module.exports, __satchel_require__);
    return module.exports;
  }

  __satchel_require__.r = function (exports) {
    if (typeof Symbol !== "undefined" && Symbol.toStringTag) {
      Object.defineProperty(exports, Symbol.toStringTag, { value: "Module" });
    }
    Object.defineProperty(exports, "__esModule", { value: true });
  };

  __satchel_require__.d = function (exports, name, getter) {
    if (!hasOwn.call(exports, name)) {
      Object.defineProperty(exports, name, { enumerable: true, get: getter });
    }
  };

  __satchel_require__.n = function (exports) {
    if (exports && exports.__esModule) return exports;
    var ns = {};
    __satchel_require__.d(ns, "default", function () { return exports; });
    if (exports !== null && (typeof exports === "object" || typeof exports === "function")) {
      Object.keys(exports).forEach(function (key) {
        __satchel_require__.d(ns, key, function () { return exports[key]; });
      });
    }
    return ns;
  };

  __satchel_require__.star = function (exports, from) {
    Object.keys(from).forEach(function (key) {
      if (key !== "default" && key !== "__esModule") {
        __satchel_require__.d(exports, key, function () { return from[key]; });
      }
    });
  };

  __satchel_require__.context = function (map) {
    function resolve(key) {
      if (!hasOwn.call(map, key)) {
        var err = new Error("Cannot find module '" + key + "'");
        err.code = "MODULE_NOT_FOUND";
        throw err;
      }
      return map[key];
    }
    function context(key) {
      return __satchel_require__(resolve(key));
    }
    context.keys = function () { return Object.keys(map); };
    context.resolve = resolve;
    return context;
  };

  function ready(names) {
    for (var i = 0; i < names.length; i++) {
      if (!installedChunks[names[i]]) return false;
    }
    return true;
  }

  function flush() {
    for (var i = 0; i < deferred.length; i++) {
      var item = deferred[i];
      if (!item.done && ready(item.chunks)) {
        item.done = true;
        __satchel_require__(item.id);
      }
    }
  }

  function install(data) {
    var names = data[0];
    var factories = data[1];
    var entries = data[2] || [];
    for (var id in factories) {
      if (hasOwn.call(factories, id) && !hasOwn.call(modules, id)) modules[id] = factories[id];
    }
    for (var i = 0; i < names.length; i++) installedChunks[names[i]] = true;
    for (var j = 0; j < entries.length; j++) {
      deferred.push({ id: entries[j][0], chunks: entries[j].slice(1), done: false });
    }
    flush();
  }

  var helpers = {};
  var getPrototypeOf = Object.getPrototypeOf;
  helpers.toPrimitive = function (t, r) {
    if (typeof t !== "object" || !t) return t;
    var e = t[Symbol.toPrimitive];
    if (e !== undefined) {
      var i = e.call(t, r || "default");
      if (typeof i !== "object") return i;
      throw new TypeError("@@toPrimitive must return a primitive value.");
    }
    return (r === "string" ? String : Number)(t);
  };
  helpers.toPropertyKey = function (t) {
    var i = helpers.toPrimitive(t, "string");
    return typeof i === "symbol" ? i : i + "";
  };
  helpers.defineProperty = function (e, r, t) {
    r = helpers.toPropertyKey(r);
    if (r in e) {
      Object.defineProperty(e, r, { value: t, enumerable: true, configurable: true, writable: true });
    } else {
      e[r] = t;
    }
    return e;
  };
  function ownKeys(e, r) {
    var t = Object.keys(e);
    if (Object.getOwnPropertySymbols) {
      var o = Object.getOwnPropertySymbols(e);
      if (r) o = o.filter(function (s) { return Object.getOwnPropertyDescriptor(e, s).enumerable; });
      t.push.apply(t, o);
    }
    return t;
  }
  helpers.objectSpread2 = function (e) {
    for (var r = 1; r < arguments.length; r++) {
      var t = arguments[r] != null ? arguments[r] : {};
      if (r % 2) {
        ownKeys(Object(t), true).forEach(function (k) { helpers.defineProperty(e, k, t[k]); });
      } else if (Object.getOwnPropertyDescriptors) {
        Object.defineProperties(e, Object.getOwnPropertyDescriptors(t));
      } else {
        ownKeys(Object(t)).forEach(function (k) {
          Object.defineProperty(e, k, Object.getOwnPropertyDescriptor(t, k));
        });
      }
    }
    return e;
  };
  helpers.objectWithoutPropertiesLoose = function (r, e) {
    if (r == null) return {};
    var t = {};
    for (var n in r) {
      if (hasOwn.call(r, n)) {
        if (e.indexOf(n) !== -1) continue;
        t[n] = r[n];
      }
    }
    return t;
  };
  helpers.objectWithoutProperties = function (e, t) {
    if (e == null) return {};
    var i = helpers.objectWithoutPropertiesLoose(e, t);
    if (Object.getOwnPropertySymbols) {
      var n = Object.getOwnPropertySymbols(e);
      for (var r = 0; r < n.length; r++) {
        var o = n[r];
        if (t.indexOf(o) === -1 && Object.prototype.propertyIsEnumerable.call(e, o)) i[o] = e[o];
      }
    }
    return i;
  };
  helpers.objectDestructuringEmpty = function (t) {
    if (t == null) throw new TypeError("Cannot destructure " + t);
  };
  helpers.taggedTemplateLiteral = function (e, t) {
    if (!t) t = e.slice(0);
    return Object.freeze(Object.defineProperties(e, { raw: { value: Object.freeze(t) } }));
  };
  helpers.extends = Object.assign || function (target) {
    for (var i = 1; i < arguments.length; i++) {
      var source = arguments[i];
      for (var key in source) if (hasOwn.call(source, key)) target[key] = source[key];
    }
    return target;
  };
  helpers.readOnlyError = function (r) {
    throw new TypeError('"' + r + '" is read-only');
  };
  helpers.writeOnlyError = function (r) {
    throw new TypeError('"' + r + '" is write-only');
  };
  helpers.checkInRHS = function (e) {
    if (Object(e) !== e) {
      throw new TypeError("right-hand side of 'in' should be an object, got " + (e !== null ? typeof e : "null"));
    }
    return e;
  };
  helpers.toSetter = function (t, e, n) {
    if (!e) e = [];
    var r = e.length++;
    return Object.defineProperty({}, "_", {
      set: function (o) {
        e[r] = o;
        t.apply(n, e);
      }
    });
  };

  // async functions and async generators
  function asyncGeneratorStep(gen, resolve, reject, next, thr, key, arg) {
    var info, value;
    try {
      info = gen[key](arg);
      value = info.value;
    } catch (error) {
      reject(error);
      return;
    }
    if (info.done) resolve(value);
    else Promise.resolve(value).then(next, thr);
  }
  helpers.asyncToGenerator = function (fn) {
    return function () {
      var that = this;
      var args = arguments;
      return new Promise(function (resolve, reject) {
        var gen = fn.apply(that, args);
        function next(value) { asyncGeneratorStep(gen, resolve, reject, next, thr, "next", value); }
        function thr(err) { asyncGeneratorStep(gen, resolve, reject, next, thr, "throw", err); }
        next(undefined);
      });
    };
  };
  var asyncIteratorSymbol = (typeof Symbol === "function" && Symbol.asyncIterator) || "@@asyncIterator";
  var iteratorSymbol = (typeof Symbol === "function" && Symbol.iterator) || "@@iterator";
  function OverloadYield(value, kind) {
    this.v = value;
    this.k = kind;
  }
  helpers.awaitAsyncGenerator = function (value) {
    return new OverloadYield(value, 0);
  };
  function AsyncGenerator(gen) {
    var front, back;
    function resume(key, arg) {
      try {
        var result = gen[key](arg);
        var value = result.value;
        var overloaded = value instanceof OverloadYield;
        Promise.resolve(overloaded ? value.v : value).then(function (arg) {
          if (overloaded) {
            var nextKey = key === "return" ? "return" : "next";
            if (!value.k || arg.done) {
              resume(nextKey, arg);
              return;
            }
            arg = gen[nextKey](arg).value;
          }
          settle(result.done ? "return" : "normal", arg);
        }, function (err) {
          resume("throw", err);
        });
      } catch (err) {
        settle("throw", err);
      }
    }
    function settle(type, value) {
      if (type === "return") front.resolve({ value: value, done: true });
      else if (type === "throw") front.reject(value);
      else front.resolve({ value: value, done: false });
      front = front.next;
      if (front) resume(front.key, front.arg);
      else back = null;
    }
    this._invoke = function (key, arg) {
      return new Promise(function (resolve, reject) {
        var request = { key: key, arg: arg, resolve: resolve, reject: reject, next: null };
        if (back) {
          back = back.next = request;
        } else {
          front = back = request;
          resume(key, arg);
        }
      });
    };
    if (typeof gen["return"] !== "function") this["return"] = undefined;
  }
  AsyncGenerator.prototype[asyncIteratorSymbol] = function () { return this; };
  AsyncGenerator.prototype.next = function (arg) { return this._invoke("next", arg); };
  AsyncGenerator.prototype["throw"] = function (arg) { return this._invoke("throw", arg); };
  AsyncGenerator.prototype["return"] = function (arg) { return this._invoke("return", arg); };
  helpers.wrapAsyncGenerator = function (fn) {
    return function () {
      return new AsyncGenerator(fn.apply(this, arguments));
    };
  };
  helpers.asyncGeneratorDelegate = function (inner) {
    var iter = {};
    var waiting = false;
    function pump(key, value) {
      waiting = true;
      value = new Promise(function (resolve) { resolve(inner[key](value)); });
      return { done: false, value: new OverloadYield(value, 1) };
    }
    iter[iteratorSymbol] = function () { return this; };
    iter.next = function (value) {
      if (waiting) {
        waiting = false;
        return value;
      }
      return pump("next", value);
    };
    if (typeof inner["throw"] === "function") {
      iter["throw"] = function (value) {
        if (waiting) {
          waiting = false;
          throw value;
        }
        return pump("throw", value);
      };
    }
    if (typeof inner["return"] === "function") {
      iter["return"] = function (value) {
        if (waiting) {
          waiting = false;
          return value;
        }
        return pump("return", value);
      };
    }
    return iter;
  };
  function asyncFromSyncContinuation(result) {
    if (Object(result) !== result) {
      return Promise.reject(new TypeError(result + " is not an object."));
    }
    var done = result.done;
    return Promise.resolve(result.value).then(function (value) {
      return { value: value, done: done };
    });
  }
  function AsyncFromSyncIterator(sync) {
    this.s = sync;
    this.n = sync.next;
  }
  AsyncFromSyncIterator.prototype.next = function () {
    return asyncFromSyncContinuation(this.n.apply(this.s, arguments));
  };
  AsyncFromSyncIterator.prototype["return"] = function (value) {
    var ret = this.s["return"];
    if (ret === undefined) return Promise.resolve({ value: value, done: true });
    return asyncFromSyncContinuation(ret.apply(this.s, arguments));
  };
  AsyncFromSyncIterator.prototype["throw"] = function (value) {
    var thr = this.s["throw"];
    if (thr === undefined) return Promise.reject(value);
    return asyncFromSyncContinuation(thr.apply(this.s, arguments));
  };
  helpers.asyncIterator = function (iterable) {
    var method;
    if (iterable != null) {
      method = iterable[asyncIteratorSymbol];
      if (method != null) return method.call(iterable);
      if (asyncIteratorSymbol !== "@@asyncIterator") {
        method = iterable["@@asyncIterator"];
        if (method != null) return method.call(iterable);
      }
      method = iterable[iteratorSymbol];
      if (method != null) return new AsyncFromSyncIterator(method.call(iterable));
    }
    throw new TypeError("Object is not async iterable");
  };

  // private class members
  function checkPrivateRedeclaration(e, t) {
    if (t.has(e)) throw new TypeError("Cannot initialize the same private elements twice on an object");
  }
  helpers.classPrivateFieldInitSpec = function (e, t, a) {
    checkPrivateRedeclaration(e, t);
    t.set(e, a);
  };
  helpers.classPrivateMethodInitSpec = function (e, a) {
    checkPrivateRedeclaration(e, a);
    a.add(e);
  };
  helpers.assertClassBrand = function (e, t, n) {
    if (typeof e === "function" ? e === t : e.has(t)) return arguments.length < 3 ? t : n;
    throw new TypeError("Private element is not present on this object");
  };
  helpers.classPrivateFieldGet2 = function (s, a) {
    return s.get(helpers.assertClassBrand(s, a));
  };
  helpers.classPrivateFieldSet2 = function (s, a, r) {
    s.set(helpers.assertClassBrand(s, a), r);
    return r;
  };
  var privateKeyId = 0;
  helpers.classPrivateFieldLooseKey = function (name) {
    return "__private_" + privateKeyId++ + "_" + name;
  };
  helpers.classPrivateFieldLooseBase = function (receiver, key) {
    if (!hasOwn.call(receiver, key)) throw new TypeError("attempted to use private field on non-instance");
    return receiver;
  };

  // super property access outside methods
  function superPropBase(object, property) {
    while (!hasOwn.call(object, property)) {
      object = getPrototypeOf(object);
      if (object === null) break;
    }
    return object;
  }
  function reflectGet(target, property, receiver) {
    if (typeof Reflect !== "undefined" && Reflect.get) return Reflect.get(target, property, receiver);
    var base = superPropBase(target, property);
    if (!base) return undefined;
    var desc = Object.getOwnPropertyDescriptor(base, property);
    return desc.get ? desc.get.call(receiver) : desc.value;
  }
  function reflectSet(target, property, value, receiver) {
    if (typeof Reflect !== "undefined" && Reflect.set) return Reflect.set(target, property, value, receiver);
    var base = superPropBase(target, property);
    var desc;
    if (base) {
      desc = Object.getOwnPropertyDescriptor(base, property);
      if (desc.set) {
        desc.set.call(receiver, value);
        return true;
      }
      if (!desc.writable) return false;
    }
    desc = Object.getOwnPropertyDescriptor(receiver, property);
    if (desc) {
      if (!desc.writable) return false;
      desc.value = value;
      Object.defineProperty(receiver, property, desc);
    } else {
      helpers.defineProperty(receiver, property, value);
    }
    return true;
  }
  helpers.superPropGet = function (classArg, property, receiver, flags) {
    var value = reflectGet(getPrototypeOf(flags & 1 ? classArg.prototype : classArg), property, receiver);
    if (flags & 2 && typeof value === "function") {
      return function (args) { return value.apply(receiver, args); };
    }
    return value;
  };
  helpers.superPropSet = function (classArg, property, value, receiver, isStrict, prototype) {
    var target = getPrototypeOf(prototype ? classArg.prototype : classArg);
    if (!reflectSet(target, property, value, receiver || target) && isStrict) {
      throw new TypeError("failed to set property");
    }
    return value;
  };

  // `using` declarations
  helpers.usingCtx = function () {
    var Suppressed = typeof SuppressedError === "function" ? SuppressedError : function (error, suppressed) {
      var err = new Error();
      err.name = "SuppressedError";
      err.error = error;
      err.suppressed = suppressed;
      return err;
    };
    var empty = {};
    var stack = [];
    function using(isAwait, value) {
      if (value != null) {
        if (Object(value) !== value) {
          throw new TypeError("using declarations can only be used with objects, functions, null, or undefined.");
        }
        var dispose, syncDispose;
        if (isAwait) dispose = value[Symbol.asyncDispose || Symbol["for"]("Symbol.asyncDispose")];
        if (dispose === undefined) {
          dispose = value[Symbol.dispose || Symbol["for"]("Symbol.dispose")];
          if (isAwait) syncDispose = dispose;
        }
        if (typeof dispose !== "function") throw new TypeError("Object is not disposable.");
        if (syncDispose) {
          dispose = function () {
            try {
              syncDispose.call(value);
            } catch (err) {
              return Promise.reject(err);
            }
          };
        }
        stack.push({ v: value, d: dispose, a: isAwait });
      } else if (isAwait) {
        stack.push({ d: value, a: isAwait });
      }
      return value;
    }
    return {
      e: empty,
      u: function (value) { return using(false, value); },
      a: function (value) { return using(true, value); },
      d: function () {
        var error = this.e;
        var state = 0;
        var resource;
        function next() {
          while ((resource = stack.pop())) {
            try {
              if (!resource.a && state === 1) {
                state = 0;
                stack.push(resource);
                return Promise.resolve().then(next);
              }
              if (resource.d) {
                var result = resource.d.call(resource.v);
                if (resource.a) {
                  state |= 2;
                  return Promise.resolve(result).then(next, fail);
                }
              } else {
                state |= 1;
              }
            } catch (err) {
              return fail(err);
            }
          }
          if (state === 1) return error !== empty ? Promise.reject(error) : Promise.resolve();
          if (error !== empty) throw error;
        }
        function fail(err) {
          error = error !== empty ? new Suppressed(err, error) : err;
          return next();
        }
        return next();
      }
    };
  };

  // legacy decorators
  helpers.decorate = function (decorators, target, key, desc) {
    var c = arguments.length;
    var r = c < 3 ? target : desc === null ? (desc = Object.getOwnPropertyDescriptor(target, key)) : desc;
    if (typeof Reflect === "object" && typeof Reflect.decorate === "function") {
      r = Reflect.decorate(decorators, target, key, desc);
    } else {
      for (var i = decorators.length - 1; i >= 0; i--) {
        var d = decorators[i];
        if (d) r = (c < 3 ? d(r) : c > 3 ? d(target, key, r) : d(target, key)) || r;
      }
    }
    if (c > 3 && r) Object.defineProperty(target, key, r);
    return r;
  };
  helpers.decorateParam = function (index, decorator) {
    return function (target, key) { decorator(target, key, index); };
  };
  helpers.decorateMetadata = function (key, value) {
    if (typeof Reflect === "object" && typeof Reflect.metadata === "function") return Reflect.metadata(key, value);
  };
  self.babelHelpers = helpers;

  var queue = (self.satchelChunks = self.satchelChunks || []);
  queue.forEach(install);
  var push = queue.push.bind(queue);
  queue.push = function (data) {
    push(data);
    install(data);
    return queue.length;
  };
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use satchel_graph::oxc::Allocator;
    use crate::transform::Lowering;
    use oxc_span::SourceType;
    use regex::Regex;
    use satchel_graph::scanner::parse_script;
    use std::path::Path;

    #[test]
    fn runtime_parses() {
        let allocator = Allocator::default();
        assert!(parse_script(&allocator, RUNTIME_SOURCE, Path::new("runtime.js")).is_ok());
    }

    #[test]
    fn runtime_defines_loader_and_helpers() {
        assert!(RUNTIME_SOURCE.contains(&format!("function {REQUIRE}(id)")));
        assert!(RUNTIME_SOURCE.contains(CHUNK_QUEUE));
        for helper in ["objectSpread2", "asyncToGenerator", "classPrivateFieldGet2"] {
            assert!(defines(helper), "{helper}");
        }
    }

    fn defines(helper: &str) -> bool {
        RUNTIME_SOURCE.contains(&format!("helpers.{helper} ="))
    }

    #[test]
    fn every_transformer_helper_is_defined() {
        let table = [
            "awaitAsyncGenerator",
            "asyncGeneratorDelegate",
            "asyncIterator",
            "asyncToGenerator",
            "objectSpread2",
            "wrapAsyncGenerator",
            "extends",
            "objectDestructuringEmpty",
            "objectWithoutProperties",
            "toPropertyKey",
            "defineProperty",
            "classPrivateFieldInitSpec",
            "classPrivateMethodInitSpec",
            "classPrivateFieldGet2",
            "classPrivateFieldSet2",
            "assertClassBrand",
            "toSetter",
            "classPrivateFieldLooseKey",
            "classPrivateFieldLooseBase",
            "superPropGet",
            "superPropSet",
            "readOnlyError",
            "writeOnlyError",
            "checkInRHS",
            "decorate",
            "decorateParam",
            "decorateMetadata",
            "usingCtx",
            "taggedTemplateLiteral",
        ];
        let missing: Vec<_> = table.iter().filter(|name| !defines(name)).collect();
        assert!(missing.is_empty(), "missing helpers: {missing:?}");
    }

    #[test]
    fn lowered_scripts_only_call_defined_helpers() {
        let sources = [
            "async function* numbers() { yield 1; await null; yield* more(); }\n\
             (async () => { for await (const n of numbers()) console.log(n); })();\n",
            "const { a, ...rest } = options;\nconst merged = { ...rest, a };\nconst {} = merged;\n",
            "class Counter {\n\
               #count = 0;\n\
               #bump() { this.#count += 1; }\n\
               static owns(obj) { return #count in obj; }\n\
               get value() { return this.#count; }\n\
             }\n",
            "class Child extends Base { static parent = super.name; method = async () => super.method(); }\n",
        ];
        let lowering = Lowering::new("es2015").unwrap();
        let calls = Regex::new(r"babelHelpers\.(\w+)").unwrap();

        let mut used = std::collections::BTreeSet::new();
        for source in sources {
            let out = lowering
                .lower(source, Path::new("helpers.js"), SourceType::mjs())
                .unwrap();
            used.extend(calls.captures_iter(&out).map(|c| c[1].to_string()));
        }

        for helper in ["asyncToGenerator", "wrapAsyncGenerator", "asyncIterator"] {
            assert!(used.contains(helper), "{helper} not exercised: {used:?}");
        }
        let missing: Vec<_> = used.iter().filter(|name| !defines(name)).collect();
        assert!(missing.is_empty(), "missing helpers: {missing:?}");
    }
}
