/// Configuration options for the JSON decoder.
///
/// # Examples
///
/// ```rust
/// use lazyjson::{ErrorKind, ParserOptions, parse_with};
///
/// let options = ParserOptions {
///     max_depth: Some(2),
/// };
/// assert!(parse_with(b"[[1]]", options).is_ok());
/// let err = parse_with(b"[[[1]]]", options).unwrap_err();
/// assert_eq!(err.kind(), ErrorKind::WrongRequest);
/// assert_eq!(err.offset(), Some(2));
/// ```
///
/// # Default
///
/// No limits. Walks over the tree keep their own stacks, so any depth that
/// parses can also be queried, edited and written back. Only
/// [`NodeRef::unpack`](crate::NodeRef::unpack) stops at
/// [`MAX_UNPACK_DEPTH`](crate::MAX_UNPACK_DEPTH).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Maximum number of nested arrays and objects.
    ///
    /// Opening a container deeper than this fails with
    /// [`ErrorKind::WrongRequest`](crate::ErrorKind) at the offset of its
    /// opening bracket.
    ///
    /// # Default
    ///
    /// `None`
    pub max_depth: Option<usize>,
}
