/// Source of named configuration values.
///
/// Implementations return `None` for names they do not know. Callers treat
/// blank values as absent, so implementations may pass them through.
pub trait ConfigProvider: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;

    /// Value for `name` with surrounding whitespace trimmed, or `None` when
    /// absent or blank.
    fn get_non_blank(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Raw value for `name`, or `None` when absent or blank. Unlike
    /// [`ConfigProvider::get_non_blank`], interior and surrounding whitespace
    /// are preserved.
    fn get_raw(&self, name: &str) -> Option<String> {
        self.get(name).filter(|value| !value.trim().is_empty())
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProvider for &P {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProvider for Box<P> {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProvider for std::sync::Arc<P> {
    fn get(&self, name: &str) -> Option<String> {
        (**self).get(name)
    }
}

/// Configuration names read by the credential resolver and the warehouse
/// client.
pub mod keys {
    pub const ACCOUNT: &str = "SNOWFLAKE_ACCOUNT";
    pub const USER: &str = "SNOWFLAKE_USER";
    pub const WAREHOUSE: &str = "SNOWFLAKE_WAREHOUSE";
    pub const DATABASE: &str = "SNOWFLAKE_DATABASE";
    pub const SCHEMA: &str = "SNOWFLAKE_SCHEMA";
    pub const AUTHENTICATOR: &str = "SNOWFLAKE_AUTHENTICATOR";

    /// Preferred raw PEM, may use `\n` escapes or triple-quote wrapping
    pub const PRIVATE_KEY_PEM: &str = "PRIVATE_KEY_PEM";
    /// Legacy raw PEM
    pub const PRIVATE_KEY: &str = "SNOWFLAKE_PRIVATE_KEY";
    pub const PRIVATE_KEY_B64: &str = "SNOWFLAKE_PRIVATE_KEY_B64";
    pub const PRIVATE_KEY_FILE: &str = "SNOWFLAKE_PRIVATE_KEY_FILE";
    pub const PRIVATE_KEY_PWD: &str = "SNOWFLAKE_PRIVATE_KEY_PWD";

    /// Bearer token for the REST fallback path
    pub const TOKEN: &str = "SNOWFLAKE_TOKEN";
}
