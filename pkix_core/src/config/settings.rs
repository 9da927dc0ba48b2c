use std::collections::HashMap;

/// A single configuration value as supplied by the embedding application.
#[derive(Clone, Debug, PartialEq)]
pub enum Setting {
    String(String),
    Bytes(Vec<u8>),
    Int(i64),
    Double(f64),
    Bool(bool),
}

impl Setting {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Setting::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Setting::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Setting::Double(value) => Some(*value),
            Setting::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Setting::Bytes(value) => Some(value),
            _ => None,
        }
    }

    /// Flags arrive typed, as `true`/`false`/`1`/`0` strings, or as ints.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Setting::Bool(value) => Some(*value),
            Setting::Int(value) => Some(*value != 0),
            Setting::String(value) => match value.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Some(true),
                "false" | "0" | "no" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Key/value configuration source consumed by the `from_settings`
/// constructors. A value of the wrong type reads as absent.
pub trait Settings {
    fn get(&self, key: &str) -> Option<Setting>;

    fn set(&mut self, key: &str, value: Setting);

    fn get_string(&self, key: &str) -> Option<String> {
        self.get(key)?.as_str().map(str::to_string)
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        self.get(key)?.as_int()
    }

    fn get_double(&self, key: &str) -> Option<f64> {
        self.get(key)?.as_double()
    }

    fn get_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.get(key)?.as_bytes().map(<[u8]>::to_vec)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key)?.as_bool()
    }

    fn set_string(&mut self, key: &str, value: String) {
        self.set(key, Setting::String(value));
    }

    fn set_int(&mut self, key: &str, value: i64) {
        self.set(key, Setting::Int(value));
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, Setting::Bool(value));
    }

    fn set_bytes(&mut self, key: &str, value: Vec<u8>) {
        self.set(key, Setting::Bytes(value));
    }
}

impl Settings for HashMap<String, Setting> {
    fn get(&self, key: &str) -> Option<Setting> {
        HashMap::get(self, key).cloned()
    }

    fn set(&mut self, key: &str, value: Setting) {
        self.insert(key.to_string(), value);
    }
}
