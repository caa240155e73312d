use anyhow::Result;
use tracing::{debug, info};
use url::form_urlencoded;

pub const PLACES_SCRIPT_ID: &str = "googlemaps-places";
const MAPS_SCRIPT_URL: &str = "https://maps.googleapis.com/maps/api/js";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    pub id: String,
    pub src: String,
    pub is_async: bool,
}

/// Somewhere external scripts are attached to.
pub trait ScriptHost {
    fn contains(&self, id: &str) -> bool;
    fn is_loaded(&self, id: &str) -> bool;
    /// Attach the script and return once it has loaded. A script that fails
    /// to load must not be left attached.
    fn append(&mut self, script: &Script) -> Result<()>;
}

/// Attaches a script to a host at most once and remembers when it loaded.
#[derive(Debug)]
pub struct ScriptLoader {
    script: Script,
    loaded: bool,
}

impl ScriptLoader {
    pub fn new(id: &str, src: &str, is_async: bool) -> Self {
        Self {
            script: Script {
                id: id.to_string(),
                src: src.to_string(),
                is_async,
            },
            loaded: false,
        }
    }

    /// The Maps JavaScript API with the places library.
    pub fn places(key: &str) -> Self {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("key", key)
            .append_pair("libraries", "places")
            .finish();
        Self::new(PLACES_SCRIPT_ID, &format!("{MAPS_SCRIPT_URL}?{query}"), true)
    }

    pub fn script(&self) -> &Script {
        &self.script
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    /// Safe to call repeatedly. Returns whether the script has loaded.
    pub fn load<H: ScriptHost + ?Sized>(&mut self, host: &mut H) -> Result<bool> {
        if self.loaded {
            return Ok(true);
        }
        if host.contains(&self.script.id) {
            debug!("{} is already attached", self.script.id);
            self.loaded = host.is_loaded(&self.script.id);
            return Ok(self.loaded);
        }
        debug!("Attaching {}", self.script.id);
        host.append(&self.script)?;
        info!("Loaded {}", self.script.id);
        self.loaded = true;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeHost {
        scripts: HashMap<String, bool>,
        appended: usize,
        fail: bool,
    }

    impl ScriptHost for FakeHost {
        fn contains(&self, id: &str) -> bool {
            self.scripts.contains_key(id)
        }

        fn is_loaded(&self, id: &str) -> bool {
            self.scripts.get(id).copied().unwrap_or(false)
        }

        fn append(&mut self, script: &Script) -> Result<()> {
            self.appended += 1;
            if self.fail {
                return Err(anyhow!("network unreachable"));
            }
            self.scripts.insert(script.id.clone(), true);
            Ok(())
        }
    }

    #[test]
    fn test_loads_once() {
        let mut host = FakeHost::default();
        let mut loader = ScriptLoader::new("lib", "https://example.com/lib.js", true);
        assert!(!loader.loaded());
        assert!(loader.load(&mut host).unwrap());
        assert!(loader.load(&mut host).unwrap());
        assert!(loader.loaded());
        assert_eq!(host.appended, 1);
    }

    #[test]
    fn test_second_loader_shares_host() {
        let mut host = FakeHost::default();
        let mut first = ScriptLoader::new("lib", "https://example.com/lib.js", true);
        let mut second = ScriptLoader::new("lib", "https://example.com/lib.js", true);
        first.load(&mut host).unwrap();
        assert!(second.load(&mut host).unwrap());
        assert_eq!(host.appended, 1);
    }

    #[test]
    fn test_attached_but_not_loaded() {
        let mut host = FakeHost::default();
        host.scripts.insert("lib".to_string(), false);
        let mut loader = ScriptLoader::new("lib", "https://example.com/lib.js", true);
        assert!(!loader.load(&mut host).unwrap());
        assert!(!loader.loaded());
        assert_eq!(host.appended, 0);
    }

    #[test]
    fn test_failed_load_can_retry() {
        let mut host = FakeHost {
            fail: true,
            ..Default::default()
        };
        let mut loader = ScriptLoader::new("lib", "https://example.com/lib.js", true);
        assert!(loader.load(&mut host).is_err());
        assert!(!loader.loaded());

        host.fail = false;
        assert!(loader.load(&mut host).unwrap());
        assert_eq!(host.appended, 2);
    }

    #[test]
    fn test_places_script() {
        let loader = ScriptLoader::places("abc 123");
        let script = loader.script();
        assert_eq!(script.id, PLACES_SCRIPT_ID);
        assert_eq!(
            script.src,
            "https://maps.googleapis.com/maps/api/js?key=abc+123&libraries=places"
        );
        assert!(script.is_async);
    }
}
