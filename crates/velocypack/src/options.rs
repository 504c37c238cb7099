/// Configuration options for the [`Builder`](crate::Builder).
///
/// These options decide which of the legal encodings the builder picks for
/// arrays and objects. They never change the logical value that is written.
///
/// # Examples
///
/// ```rust
/// use velocypack::{Builder, BuilderOptions};
///
/// let builder = Builder::with_options(BuilderOptions {
///     build_unindexed_arrays: true,
///     ..Default::default()
/// });
/// # let _ = builder;
/// ```
#[derive(Debug, Clone, Copy)]
#[allow(clippy::struct_excessive_bools)]
pub struct BuilderOptions {
    /// Write arrays in the compact layout (LEB128 byte length, trailing member
    /// count, no index table) instead of the indexed layout.
    ///
    /// Compact arrays are smaller but `get_index` has to walk every preceding
    /// member. When the byte length would need more than eight LEB128 bytes the
    /// builder falls back to the indexed layout.
    ///
    /// # Default
    ///
    /// `false`
    pub build_unindexed_arrays: bool,

    /// Write objects in the compact layout. Key lookups on compact objects are
    /// always linear scans.
    ///
    /// # Default
    ///
    /// `false`
    pub build_unindexed_objects: bool,

    /// Sort the index table of objects by raw key bytes when closing them.
    ///
    /// Sorted objects with at least four members are searched with a binary
    /// search. Unsorted objects keep insertion order in their index table and
    /// are searched linearly.
    ///
    /// # Default
    ///
    /// `true`
    pub sort_attribute_names: bool,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            build_unindexed_arrays: false,
            build_unindexed_objects: false,
            sort_attribute_names: true,
        }
    }
}

/// Nesting limit for validation and for the recursive walks behind
/// [`Slice::schema_description`](crate::Slice::schema_description) and
/// `Serialize for Slice`.
pub(crate) const DEFAULT_MAX_DEPTH: usize = 64;

/// Limits applied by [`Slice::validate`](crate::Slice::validate) when checking
/// buffers received from untrusted sources.
#[derive(Debug, Clone, Copy)]
pub struct ValidatorOptions {
    /// Maximum nesting depth of arrays, objects and tags.
    ///
    /// # Default
    ///
    /// `64`
    pub max_depth: usize,

    /// Check that string payloads are valid UTF-8.
    ///
    /// # Default
    ///
    /// `true`
    pub check_utf8: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            check_utf8: true,
        }
    }
}
