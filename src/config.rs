/// Limits applied by [`JsonReader`](crate::reader::JsonReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReaderConfig {
    /// Deepest allowed nesting of arrays and objects.
    pub max_depth: usize,
    /// Longest string or number literal, in bytes of source text.
    pub max_literal_len: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_literal_len: 16 * 1024 * 1024,
        }
    }
}

/// Controls how a [`RegistryBuilder`](crate::registry::RegistryBuilder) freezes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// When true, `freeze` fails on dangling references and pure alias cycles.
    pub verify_references: bool,
    /// When true, registering a taken name replaces the earlier spec.
    pub allow_redefinition: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            verify_references: true,
            allow_redefinition: false,
        }
    }
}
