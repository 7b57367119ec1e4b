// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Tag

/// Tags that should be unique across the analysis
///
/// Each _log_ event within the application is given a unique tag to identify
/// it. There are two reserved tag values: [`NO_TAG`](crate::NO_TAG) and
/// [`ROOT`](crate::ROOT).
#[derive(Copy, Clone, Default, Eq, Hash, PartialEq)]
pub struct Tag(pub u64);

impl std::fmt::Display for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Debug for Tag {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
