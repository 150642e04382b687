//! Canonical order of a node's entries:
//! previous page, next page, children in construction order, back to parent.

use super::node::{BackKind, Link};

fn rank(link: &Link) -> u8 {
    match link {
        Link::Back(marker) if marker.kind == BackKind::PreviousPage => 0,
        Link::NextPage { .. } => 1,
        Link::Child { .. } => 2,
        Link::Back(_) => 3,
    }
}

/// Stable sort, so children keep their construction order
pub fn sort_entries(entries: &mut [Link]) {
    entries.sort_by_key(rank);
}
