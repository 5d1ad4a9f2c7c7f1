/// Limits applied while parsing query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest allowed parenthesis nesting.
    pub max_depth: usize,
    /// Most comparisons one query may hold. `;` and `,` chains fold into a
    /// tree as deep as they are long, so this also bounds tree depth.
    pub max_comparisons: usize,
}

impl ParseOptions {
    pub const DEFAULT_MAX_DEPTH: usize = 64;
    pub const DEFAULT_MAX_COMPARISONS: usize = 1024;

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }

    pub fn with_max_comparisons(max_comparisons: usize) -> Self {
        Self {
            max_comparisons,
            ..Self::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_comparisons: Self::DEFAULT_MAX_COMPARISONS,
        }
    }
}

/// How a comparison treats a property whose value is absent on the instance.
///
/// `=ex=` is unaffected: it exists to test presence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbsentPolicy {
    /// Absent equals nothing: `==`, `=in=`, ordering and pattern operators fail,
    /// `!=` and `=out=` succeed.
    #[default]
    Distinct,
    /// Absent values never match any value comparison, negated ones included.
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompileOptions {
    pub absent: AbsentPolicy,
}

impl CompileOptions {
    pub fn with_absent(absent: AbsentPolicy) -> Self {
        Self { absent }
    }
}
