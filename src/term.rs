//! Query term (leaf) representation, grounded on `querynode.h`'s `QueryTerm`
//! and `QueryExpr` option bit layout.

use std::sync::atomic::{AtomicU32, Ordering};

pub const DEFAULT_WEIGHT: i32 = 100;

/// A tiny bitflags-shaped macro: the corpus doesn't pull in the `bitflags`
/// crate anywhere, so this hand-rolls the same ergonomics (`|`, `contains`,
/// `insert`) for the one flag set the query tree needs.
macro_rules! bitflags_like {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $repr:ty {
            $(const $flag:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
        pub struct $name(pub $repr);

        impl $name {
            $(pub const $flag: $name = $name($value);)*
            pub const NONE: $name = $name(0);

            pub const fn contains(self, other: $name) -> bool {
                (self.0 & other.0) == other.0 && other.0 != 0
            }

            pub const fn intersects(self, other: $name) -> bool {
                (self.0 & other.0) != 0
            }

            pub fn insert(&mut self, other: $name) {
                self.0 |= other.0;
            }
        }

        impl std::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: $name) {
                self.0 |= rhs.0;
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                let mut names = Vec::new();
                $(if self.contains($name::$flag) { names.push(stringify!($flag)); })*
                write!(f, "{}({:#x})", names.join("|"), self.0)
            }
        }
    };
}

bitflags_like! {
    /// Option bits shared by terms and non-terminal nodes. Bit values mirror
    /// the `X_*` defines in the original `querynode.h` so that anyone who
    /// has read the C++ source recognizes the layout immediately.
    pub struct NodeOptions: u32 {
        const ORDERED      = 0x1;
        const LIMIT        = 0x2;
        const EXACT        = 0x4;
        const COMPLETE     = 0x8;
        const AND          = 0x10;
        const OR           = 0x20;
        const ANY          = 0x40;
        const CONSTR       = 0x100;
        const CHKVAL       = 0x200;
        const NOT          = 0x400;
        const PREFIX       = 0x1000;
        const POSTFIX      = 0x2000;
        const WILD         = 0x4000;
        const ONLY_1       = 0x8000;
        const SPECIALTOKEN = 0x10000;
    }
}

/// Per-document hit statistics on a term, reset per `Result`/document.
#[derive(Debug, Default)]
pub struct TermStats {
    pub total_match_cnt: AtomicU32,
    pub exact_match_cnt: AtomicU32,
}

impl TermStats {
    pub fn reset(&self) {
        self.total_match_cnt.store(0, Ordering::Relaxed);
        self.exact_match_cnt.store(0, Ordering::Relaxed);
    }

    pub fn record(&self, exact: bool) {
        self.total_match_cnt.fetch_add(1, Ordering::Relaxed);
        if exact {
            self.exact_match_cnt.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn total(&self) -> u32 {
        self.total_match_cnt.load(Ordering::Relaxed)
    }

    pub fn exact(&self) -> u32 {
        self.exact_match_cnt.load(Ordering::Relaxed)
    }
}

/// A single query term (leaf of the query tree).
#[derive(Debug)]
pub struct QueryTerm {
    /// Normalized UCS-4 representation.
    pub ucs4: Vec<u32>,
    /// Byte length of the term as originally written.
    pub byte_len: usize,
    pub options: NodeOptions,
    pub weight: i32,
    /// Per-query unique index; equal to this term's position in the
    /// compiled Match Object's term vector once assigned.
    pub idx: usize,
    /// Name of the index this term targets, used for rewriter lookup.
    pub index_name: String,
    pub stats: TermStats,
}

impl QueryTerm {
    pub fn new(ucs4: Vec<u32>, byte_len: usize, index_name: impl Into<String>) -> Self {
        QueryTerm {
            ucs4,
            byte_len,
            options: NodeOptions::NONE,
            weight: DEFAULT_WEIGHT,
            idx: 0,
            index_name: index_name.into(),
            stats: TermStats::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.ucs4.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ucs4.is_empty()
    }

    pub fn is_prefix(&self) -> bool {
        self.options.contains(NodeOptions::PREFIX)
    }

    pub fn is_wildcard(&self) -> bool {
        self.options.contains(NodeOptions::WILD)
    }

    pub fn is_special_token(&self) -> bool {
        self.options.contains(NodeOptions::SPECIALTOKEN)
    }

    pub fn is_exact_only(&self) -> bool {
        self.options.contains(NodeOptions::EXACT)
    }

    /// First UCS-4 code unit, used as the bucket key in the Match Object's
    /// `term_by_first_codepoint` hash, or `'*'`/`'?'` for wildcard terms
    /// that carry no fixed first character.
    pub fn first_codepoint(&self) -> u32 {
        self.ucs4.first().copied().unwrap_or(0)
    }
}
