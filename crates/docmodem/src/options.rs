/// Configuration options for the document protocol adapter.
///
/// These options opt back into behaviors of the historical bridge that the
/// default configuration deliberately replaces with lossless equivalents.
///
/// # Examples
///
/// ```rust
/// use docmodem::BridgeOptions;
///
/// let options = BridgeOptions {
///     text_binary: true,
///     ..Default::default()
/// };
/// # let _ = options;
/// ```
///
/// # Default
///
/// All options default to `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BridgeOptions {
    /// Whether to store byte sequences as UTF-8 text instead of opaque
    /// binary values.
    ///
    /// Documents produced by the original bridge encoded binary fields as
    /// text; enabling this reproduces that layout. The bytes are validated
    /// and a [`BridgeError::Encoding`](crate::BridgeError) is returned when
    /// they are not valid UTF-8, so arbitrary binary payloads require the
    /// default opaque representation.
    ///
    /// # Default
    ///
    /// `false`
    pub text_binary: bool,

    /// Whether to coerce integer map keys through their decimal text form.
    ///
    /// Documents are string-keyed, so a non-string map key cannot be stored
    /// as-is. By default the adapter fails fast with
    /// [`BridgeError::UnsupportedKeyType`](crate::BridgeError). With this
    /// option enabled, `i8`/`i16`/`i32`/`i64` keys are written as their
    /// decimal rendering and parsed back on replay; other key kinds still
    /// fail.
    ///
    /// # Default
    ///
    /// `false`
    pub stringify_map_keys: bool,
}
