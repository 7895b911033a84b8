use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::RegistryError;
use crate::traits::Provider;

/// Runtime name to provider mapping.
///
/// Built once at startup and shared by reference. Iteration order is the
/// sorted order of runtime names, which also decides prefix-match ties in
/// the dispatcher.
#[derive(Default)]
pub struct Registry {
    providers: RwLock<BTreeMap<String, Arc<dyn Provider>>>,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider under its own name.
    ///
    /// # Errors
    /// Returns [`RegistryError::DuplicateName`] if the name is taken; the
    /// existing provider stays registered.
    pub fn register(&self, provider: Arc<dyn Provider>) -> Result<(), RegistryError> {
        let name = provider.name().to_string();
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if providers.contains_key(&name) {
            return Err(RegistryError::DuplicateName { name });
        }

        log::debug!("Registered provider {name}");
        providers.insert(name, provider);
        Ok(())
    }

    /// # Errors
    /// Returns [`RegistryError::UnknownRuntime`] if nothing is registered
    /// under `name`.
    pub fn unregister(&self, name: &str) -> Result<Arc<dyn Provider>, RegistryError> {
        let mut providers = self
            .providers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        match providers.remove(name) {
            Some(provider) => Ok(provider),
            None => Err(RegistryError::UnknownRuntime {
                name: name.to_string(),
                available: providers.keys().cloned().collect(),
            }),
        }
    }

    /// # Errors
    /// Returns [`RegistryError::UnknownRuntime`] carrying the registered
    /// names so callers can list them.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Provider>, RegistryError> {
        let providers = self
            .providers
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        providers
            .get(name)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownRuntime {
                name: name.to_string(),
                available: providers.keys().cloned().collect(),
            })
    }

    #[must_use]
    pub fn get_all(&self) -> Vec<Arc<dyn Provider>> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn list(&self) -> Vec<String> {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.providers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use super::Registry;
    use crate::error::{ProviderError, RegistryError};
    use crate::traits::Provider;
    use crate::types::{InstalledVersion, ResolvedVersion, Version};

    struct NamedProvider {
        name: &'static str,
        display: &'static str,
    }

    impl NamedProvider {
        fn arc(name: &'static str, display: &'static str) -> Arc<dyn Provider> {
            Arc::new(Self { name, display })
        }
    }

    impl Provider for NamedProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn display_name(&self) -> &'static str {
            self.display
        }

        fn shim_names(&self) -> &'static [&'static str] {
            &[]
        }

        fn installed_versions(&self) -> Result<Vec<InstalledVersion>, ProviderError> {
            Ok(Vec::new())
        }

        fn is_installed(&self, _version: &Version) -> bool {
            false
        }

        fn install_dir(&self, version: &Version) -> PathBuf {
            PathBuf::from(version.as_str())
        }

        fn executable_path(&self, version: &Version) -> Result<PathBuf, ProviderError> {
            Err(ProviderError::not_installed(self.name, version))
        }

        fn executable_dirs(&self, _version: &Version) -> Vec<PathBuf> {
            Vec::new()
        }

        fn global_version(&self) -> Result<Option<Version>, ProviderError> {
            Ok(None)
        }

        fn set_global_version(&self, _version: &Version) -> Result<(), ProviderError> {
            Ok(())
        }

        fn local_version(&self, _dir: &Path) -> Result<Option<Version>, ProviderError> {
            Ok(None)
        }

        fn set_local_version(&self, _dir: &Path, _version: &Version) -> Result<(), ProviderError> {
            Ok(())
        }

        fn current_version(&self, _cwd: &Path) -> Result<ResolvedVersion, ProviderError> {
            Err(ProviderError::not_configured(self.name))
        }

        fn should_reshim(&self, _command: &str, _args: &[OsString]) -> bool {
            false
        }
    }

    #[test]
    fn register_makes_provider_visible() {
        let registry = Registry::new();

        registry
            .register(NamedProvider::arc("node", "Node.js"))
            .expect("first registration succeeds");

        assert!(registry.has("node"));
        assert_eq!(registry.list(), vec!["node".to_string()]);
        assert_eq!(registry.get_all().len(), 1);
        assert_eq!(
            registry.get("node").expect("lookup succeeds").display_name(),
            "Node.js"
        );
    }

    #[test]
    fn duplicate_registration_fails_and_keeps_first() {
        let registry = Registry::new();
        registry
            .register(NamedProvider::arc("node", "first"))
            .expect("first registration succeeds");

        let result = registry.register(NamedProvider::arc("node", "second"));

        assert_eq!(
            result,
            Err(RegistryError::DuplicateName {
                name: "node".to_string()
            })
        );
        assert_eq!(
            registry.get("node").expect("lookup succeeds").display_name(),
            "first"
        );
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn get_unknown_reports_name_and_available() {
        let registry = Registry::new();
        registry
            .register(NamedProvider::arc("python", "Python"))
            .expect("registration succeeds");
        registry
            .register(NamedProvider::arc("node", "Node.js"))
            .expect("registration succeeds");

        let Err(error) = registry.get("ruby") else {
            panic!("lookup of unknown runtime should fail");
        };

        assert_eq!(
            error,
            RegistryError::UnknownRuntime {
                name: "ruby".to_string(),
                available: vec!["node".to_string(), "python".to_string()],
            }
        );
    }

    #[test]
    fn unregister_removes_and_rejects_absent() {
        let registry = Registry::new();
        registry
            .register(NamedProvider::arc("node", "Node.js"))
            .expect("registration succeeds");

        let removed = registry.unregister("node").expect("unregister succeeds");
        assert_eq!(removed.name(), "node");
        assert!(!registry.has("node"));

        assert!(matches!(
            registry.unregister("node"),
            Err(RegistryError::UnknownRuntime { .. })
        ));
    }

    #[test]
    fn concurrent_registration_keeps_every_unique_name() {
        const NAMES: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];
        let registry = Arc::new(Registry::new());

        let handles: Vec<_> = NAMES
            .into_iter()
            .map(|name| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    let first = registry.register(NamedProvider::arc(name, "x"));
                    let second = registry.register(NamedProvider::arc(name, "y"));
                    (first.is_ok(), second.is_ok())
                })
            })
            .collect();

        for handle in handles {
            let (first, second) = handle.join().expect("worker thread should not panic");
            assert!(first);
            assert!(!second);
        }
        assert_eq!(registry.list().len(), NAMES.len());
    }
}
