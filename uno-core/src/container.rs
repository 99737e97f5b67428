// Name-based dependency container

use crate::{Error, Result};
use parking_lot::{Mutex, RwLock};
use std::any::{type_name, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, Weak};
use uno_log::{debug, trace};

/// A resolved dependency.
pub type Instance = Arc<dyn Any + Send + Sync>;

type Factory = Arc<dyn Fn(&Deps) -> Result<Instance> + Send + Sync>;

/// Prefix marking a name as [`Scope::Transient`] in [`Container::register`].
pub const TRANSIENT_SIGIL: char = '#';

/// Name the container registers itself under.
pub const CONTAINER: &str = "container";

/// How long a resolved value lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The factory runs once; every resolution returns the same instance.
    Singleton,
    /// The factory (and its whole dependency chain) runs on every resolution.
    Transient,
}

struct Entry {
    dependencies: Vec<String>,
    scope: Scope,
    type_name: &'static str,
    factory: Factory,
    instance: OnceLock<Instance>,
    init: Mutex<()>,
}

#[derive(Default)]
struct Registry {
    entries: RwLock<HashMap<String, Arc<Entry>>>,
}

thread_local! {
    // (container id, name) pairs currently being built on this thread.
    static RESOLVING: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// Marks `name` as under construction until dropped.
struct ResolutionFrame;

impl ResolutionFrame {
    fn enter(container: usize, name: &str) -> Result<Self> {
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|(id, n)| *id == container && n == name) {
                let mut chain: Vec<&str> = stack
                    .iter()
                    .filter(|(id, _)| *id == container)
                    .map(|(_, n)| n.as_str())
                    .skip_while(|n| *n != name)
                    .collect();
                chain.push(name);
                return Err(Error::CyclicDependency(chain.join(" -> ")));
            }
            stack.push((container, name.to_string()));
            Ok(ResolutionFrame)
        })
    }
}

impl Drop for ResolutionFrame {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// Lower-cases a dependency name and drops a leading [`TRANSIENT_SIGIL`],
/// which is never part of the stored name.
pub fn normalize_name(name: &str) -> String {
    let name = name.trim();
    name.strip_prefix(TRANSIENT_SIGIL).unwrap_or(name).to_lowercase()
}

/// Dependencies resolved for one factory or handler invocation, in the
/// order they were declared.
pub struct Deps {
    entries: Vec<(String, Instance)>,
}

impl Deps {
    pub(crate) fn new(entries: Vec<(String, Instance)>) -> Self {
        Self { entries }
    }

    /// The dependency declared at position `index`.
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        let (name, instance) = self
            .entries
            .get(index)
            .ok_or_else(|| Error::MissingArgument(format!("#{index}")))?;
        downcast(name, instance.clone())
    }

    /// The dependency declared under `name`.
    pub fn named<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let key = normalize_name(name);
        let (name, instance) = self
            .entries
            .iter()
            .find(|(n, _)| *n == key)
            .ok_or_else(|| Error::MissingArgument(key.clone()))?;
        downcast(name, instance.clone())
    }

    /// Type-erased access by position.
    pub fn raw(&self, index: usize) -> Option<&Instance> {
        self.entries.get(index).map(|(_, i)| i)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn downcast<T: Any + Send + Sync>(name: &str, instance: Instance) -> Result<Arc<T>> {
    instance.downcast::<T>().map_err(|_| Error::DependencyType {
        name: name.to_string(),
        expected: type_name::<T>(),
    })
}

/// Registry of named factories with lazy, optionally cached resolution.
///
/// A factory declares the names it depends on when it is registered; on
/// resolution those names are resolved first (recursively) and handed to
/// the factory in declaration order. Names are case-insensitive.
///
/// ```
/// use uno_core::Container;
///
/// struct Greeting(String);
///
/// let container = Container::new();
/// container.register("name", &[], |_| Ok("world".to_string()));
/// container.register("greeting", &["name"], |deps| {
///     Ok(Greeting(format!("hello {}", deps.get::<String>(0)?)))
/// });
///
/// let greeting = container.resolve::<Greeting>("Greeting").unwrap();
/// assert_eq!(greeting.0, "hello world");
/// ```
#[derive(Clone)]
pub struct Container {
    registry: Arc<Registry>,
}

impl Container {
    pub fn new() -> Self {
        let container = Self {
            registry: Arc::new(Registry::default()),
        };

        let weak: Weak<Registry> = Arc::downgrade(&container.registry);
        container.register_scoped(CONTAINER, &[], Scope::Transient, move |_| {
            weak.upgrade()
                .map(|registry| Container { registry })
                .ok_or_else(|| Error::UnresolvedDependency(CONTAINER.to_string()))
        });

        debug!(target: "uno::container", "container created");
        container
    }

    pub(crate) fn id(&self) -> usize {
        Arc::as_ptr(&self.registry) as usize
    }

    /// Register a factory. A name starting with `#` registers a transient
    /// entry (the `#` is not part of the name); any other name is a
    /// singleton. Re-registering a name replaces the previous entry.
    pub fn register<T, F>(&self, name: &str, dependencies: &[&str], factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Deps) -> Result<T> + Send + Sync + 'static,
    {
        match name.strip_prefix(TRANSIENT_SIGIL) {
            Some(rest) => self.register_scoped(rest, dependencies, Scope::Transient, factory),
            None => self.register_scoped(name, dependencies, Scope::Singleton, factory),
        }
    }

    /// Register a factory with an explicit scope. A leading `#` is dropped
    /// from `name` and does not change `scope`.
    pub fn register_scoped<T, F>(&self, name: &str, dependencies: &[&str], scope: Scope, factory: F)
    where
        T: Any + Send + Sync,
        F: Fn(&Deps) -> Result<T> + Send + Sync + 'static,
    {
        let factory: Factory = Arc::new(move |deps| Ok(Arc::new(factory(deps)?) as Instance));
        self.insert(name, dependencies, scope, type_name::<T>(), factory, None);
    }

    /// Register a ready-made value as a singleton.
    pub fn instance<T: Any + Send + Sync>(&self, name: &str, value: T) {
        let instance: Instance = Arc::new(value);
        let stored = instance.clone();
        let factory: Factory = Arc::new(move |_| Ok(stored.clone()));
        self.insert(name, &[], Scope::Singleton, type_name::<T>(), factory, Some(instance));
    }

    fn insert(
        &self,
        name: &str,
        dependencies: &[&str],
        scope: Scope,
        type_name: &'static str,
        factory: Factory,
        ready: Option<Instance>,
    ) {
        let key = normalize_name(name);
        let entry = Entry {
            dependencies: dependencies.iter().map(|d| normalize_name(d)).collect(),
            scope,
            type_name,
            factory,
            instance: OnceLock::new(),
            init: Mutex::new(()),
        };
        if let Some(instance) = ready {
            let _ = entry.instance.set(instance);
        }

        debug!(
            target: "uno::container",
            "registered '{}' ({:?}, {}) depending on {:?}",
            key,
            scope,
            type_name,
            entry.dependencies
        );
        self.registry.entries.write().insert(key, Arc::new(entry));
    }

    fn entry(&self, key: &str) -> Option<Arc<Entry>> {
        self.registry.entries.read().get(key).cloned()
    }

    /// Resolve `name` and downcast it to `T`.
    pub fn resolve<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let instance = self.resolve_any(name)?;
        downcast(&normalize_name(name), instance)
    }

    /// Resolve `name`, or `None` when it (or anything it depends on) is
    /// not registered. Every other failure is still an error.
    pub fn try_resolve<T: Any + Send + Sync>(&self, name: &str) -> Result<Option<Arc<T>>> {
        match self.resolve::<T>(name) {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_unresolved() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Resolve `name` without downcasting.
    pub fn resolve_any(&self, name: &str) -> Result<Instance> {
        let key = normalize_name(name);
        let entry = self
            .entry(&key)
            .ok_or_else(|| Error::UnresolvedDependency(key.clone()))?;

        if let Some(instance) = entry.instance.get() {
            trace!(target: "uno::container", "'{}' served from cache", key);
            return Ok(instance.clone());
        }

        let _frame = ResolutionFrame::enter(self.id(), &key)?;
        match entry.scope {
            Scope::Transient => {
                trace!(target: "uno::container", "building transient '{}'", key);
                self.build(&entry)
            }
            Scope::Singleton => {
                let _init = entry.init.lock();
                if let Some(instance) = entry.instance.get() {
                    return Ok(instance.clone());
                }
                let instance = self.build(&entry)?;
                let _ = entry.instance.set(instance.clone());
                debug!(target: "uno::container", "singleton '{}' created", key);
                Ok(instance)
            }
        }
    }

    fn build(&self, entry: &Entry) -> Result<Instance> {
        let deps = self.collect(entry.dependencies.iter().map(String::as_str))?;
        (entry.factory)(&deps)
    }

    fn collect<'a>(&self, names: impl Iterator<Item = &'a str>) -> Result<Deps> {
        let entries = names
            .map(|name| {
                let key = normalize_name(name);
                self.resolve_any(&key).map(|instance| (key, instance))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Deps::new(entries))
    }

    /// Resolve `dependencies` in order and invoke `f` with them.
    ///
    /// This is the single wiring mechanism: factories, route handlers and
    /// group bodies all receive their inputs this way.
    pub fn call<R, F>(&self, dependencies: &[&str], f: F) -> Result<R>
    where
        F: FnOnce(&Deps) -> Result<R>,
    {
        let deps = self.collect(dependencies.iter().copied())?;
        f(&deps)
    }

    pub fn has(&self, name: &str) -> bool {
        self.registry.entries.read().contains_key(&normalize_name(name))
    }

    pub fn scope_of(&self, name: &str) -> Option<Scope> {
        self.entry(&normalize_name(name)).map(|e| e.scope)
    }

    /// Declared dependency names of `name`.
    pub fn dependencies_of(&self, name: &str) -> Option<Vec<String>> {
        self.entry(&normalize_name(name)).map(|e| e.dependencies.clone())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.entries.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.registry.entries.read();
        let mut map = f.debug_map();
        for (name, entry) in entries.iter() {
            map.entry(name, &entry.type_name);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_cycle_chain_message() {
        let container = Container::new();
        container.register("a", &["b"], |_| Ok(1u8));
        container.register("b", &["c"], |_| Ok(2u8));
        container.register("c", &["a"], |_| Ok(3u8));

        match container.resolve_any("A") {
            Err(Error::CyclicDependency(chain)) => assert_eq!(chain, "a -> b -> c -> a"),
            other => panic!("expected cycle, got {:?}", other.map(|_| ())),
        }

        // The resolution stack unwinds after the failure.
        container.register("c", &[], |_| Ok(3u8));
        assert!(container.resolve_any("a").is_ok());
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let container = Container::new();
        container.register("loop", &["LOOP"], |_| Ok(()));
        assert!(matches!(
            container.resolve_any("loop"),
            Err(Error::CyclicDependency(ref c)) if c == "loop -> loop"
        ));
    }

    #[test]
    fn test_nested_resolution_through_container_handle_detects_cycle() {
        let container = Container::new();
        container.register("outer", &[CONTAINER], |deps| {
            let inner = deps.get::<Container>(0)?;
            inner.resolve::<u32>("outer").map(|v| *v)
        });
        assert!(matches!(
            container.resolve_any("outer"),
            Err(Error::CyclicDependency(_))
        ));
    }

    #[test]
    fn test_separate_containers_do_not_share_cycle_state() {
        let first = Container::new();
        let second = Container::new();
        second.register("value", &[], |_| Ok(5u32));
        let other = second.clone();
        first.register("value", &[], move |_| other.resolve::<u32>("value").map(|v| *v + 1));

        assert_eq!(*first.resolve::<u32>("value").unwrap(), 6);
    }

    #[test]
    fn test_failed_singleton_is_retried() {
        let container = Container::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = attempts.clone();
        container.register("flaky", &[], move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::handler("not yet"))
            } else {
                Ok("ready")
            }
        });

        assert!(container.resolve::<&str>("flaky").is_err());
        assert_eq!(*container.resolve::<&str>("flaky").unwrap(), "ready");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_deps_access() {
        let container = Container::new();
        container.instance("port", 8080u16);
        container.instance("host", "localhost".to_string());

        container
            .call(&["Host", "port"], |deps| {
                assert_eq!(deps.len(), 2);
                assert_eq!(deps.names().collect::<Vec<_>>(), vec!["host", "port"]);
                assert_eq!(*deps.get::<u16>(1)?, 8080);
                assert_eq!(deps.named::<String>("HOST")?.as_str(), "localhost");
                assert!(matches!(
                    deps.get::<u32>(1),
                    Err(Error::DependencyType { .. })
                ));
                assert!(matches!(deps.get::<u16>(2), Err(Error::MissingArgument(ref a)) if a == "#2"));
                assert!(matches!(deps.named::<u16>("db"), Err(Error::MissingArgument(_))));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_undeclared_argument_is_an_error_not_absence() {
        let container = Container::new();
        container.instance("a", 1u8);
        container.register("helper", &["a"], |deps| {
            let b = deps.get::<u8>(1)?;
            Ok(*b)
        });

        assert!(matches!(
            container.try_resolve::<u8>("helper"),
            Err(Error::MissingArgument(ref a)) if a == "#1"
        ));
        assert!(container.try_resolve::<u8>("nothing").unwrap().is_none());
    }

    #[test]
    fn test_sigil_is_stripped_from_every_registration() {
        let container = Container::new();
        container.instance("#port", 8080u16);
        container.register_scoped("#Host", &[], Scope::Singleton, |_| Ok("localhost"));

        assert_eq!(*container.resolve::<u16>("port").unwrap(), 8080);
        assert_eq!(*container.resolve::<&str>("host").unwrap(), "localhost");
        assert_eq!(container.scope_of("host"), Some(Scope::Singleton));
        assert!(container.names().iter().all(|n| !n.starts_with(TRANSIENT_SIGIL)));
        assert_eq!(*container.resolve::<u16>("#port").unwrap(), 8080);
    }
}
