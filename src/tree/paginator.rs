//! Paginator
//!
//! Splits text pages and file listings into a chain of pages, each within
//! the body length limit. Page 0 of a chain is the node being continued; every
//! further page is a new node owned by the folder node being populated.
//!
//! Splitting works on characters, never on bytes, so multi-byte text is cut
//! at valid boundaries.

use crate::config::Limits;
use crate::providers::{RemoteFile, RemoteItem};
use crate::strings::Strings;

use super::node::{BackMarker, ContentNode, IdAllocator, Link, NodeId};
use super::ordering::sort_entries;

/// Blank line between the page header and the page content
pub const SEPARATOR: &str = "\n\n";
const SEPARATOR_LEN: usize = SEPARATOR.len();

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cut `text` into chunks of at most `size` characters. Empty text yields
/// no chunks.
pub fn chunk_chars(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|chunk| chunk.iter().collect()).collect()
}

/// Page bodies for `units` appended after `continuation_body`.
///
/// The first returned body replaces the continuation page's body; every
/// further body is a new page of the form `base_body + SEPARATOR + chunk`.
/// A continuation body longer than `max_body_len` is itself cut into pages
/// first. Returns an empty list when nothing changes.
pub fn paginate(
    continuation_body: &str,
    base_body: &str,
    units: &[String],
    max_body_len: usize,
) -> Vec<String> {
    let base_len = char_len(base_body);
    // A header that leaves no room is dropped from new pages
    let (header, room) = if base_len + SEPARATOR_LEN < max_body_len {
        (Some(base_body), max_body_len - base_len - SEPARATOR_LEN)
    } else {
        (None, max_body_len)
    };
    let page_body = |chunk: &str| match header {
        Some(header) => format!("{}{}{}", header, SEPARATOR, chunk),
        None => chunk.to_string(),
    };

    let mut bodies = Vec::new();
    let mut continuation = continuation_body.to_string();
    if char_len(continuation_body) > max_body_len {
        let mut pieces = chunk_chars(continuation_body, max_body_len);
        if let Some(last) = pieces.pop() {
            continuation = last;
        }
        bodies = pieces;
    }

    let mut chunks = units.iter().flat_map(|unit| chunk_chars(unit, room));
    let Some(first) = chunks.next() else {
        if !bodies.is_empty() {
            bodies.push(continuation);
        }
        return bodies;
    };

    if char_len(&continuation) + SEPARATOR_LEN + char_len(&first) <= max_body_len {
        bodies.push(format!("{}{}{}", continuation, SEPARATOR, first));
    } else {
        bodies.push(continuation);
        bodies.push(page_body(&first));
    }
    bodies.extend(chunks.map(|chunk| page_body(&chunk)));
    bodies
}

/// Text page bodies ordered by page number
pub fn text_units(items: &[RemoteItem]) -> Vec<String> {
    let mut pages: Vec<(u32, &String)> = items
        .iter()
        .filter_map(|item| match item {
            RemoteItem::TextPage { page_number, body } => Some((*page_number, body)),
            _ => None,
        })
        .collect();
    pages.sort_by_key(|(page_number, _)| *page_number);
    pages.into_iter().map(|(_, body)| body.clone()).collect()
}

/// One rendered bullet list per batch of `files_per_page` files
pub fn file_units(files: &[RemoteFile], files_per_page: usize, strings: &Strings) -> Vec<String> {
    files
        .chunks(files_per_page.max(1))
        .map(|batch| {
            batch
                .iter()
                .map(|file| strings.file_line(&file.name, &file.url))
                .collect::<String>()
        })
        .collect()
}

/// The folder node that owns every page of a chain
#[derive(Debug, Clone)]
pub struct PageOwner {
    pub id: NodeId,
    /// Body before pagination; repeated as the header of every new page
    pub base_body: String,
    /// Entries before pagination; inherited by every new page
    pub entries: Vec<Link>,
}

impl PageOwner {
    pub fn of(node: &ContentNode) -> Self {
        Self {
            id: node.id,
            base_body: node.body.clone(),
            entries: node.entries.clone(),
        }
    }
}

/// Builds linked page chains
pub struct Paginator<'a> {
    ids: &'a IdAllocator,
    strings: &'a Strings,
    limits: Limits,
}

impl<'a> Paginator<'a> {
    pub fn new(ids: &'a IdAllocator, strings: &'a Strings, limits: Limits) -> Self {
        Self { ids, strings, limits }
    }

    /// Append text pages to `continuation`
    pub fn text_chain(&self, continuation: ContentNode, owner: &PageOwner, items: &[RemoteItem]) -> Vec<ContentNode> {
        self.chain(continuation, owner, &text_units(items))
    }

    /// Append file listings to `continuation`
    pub fn file_chain(&self, continuation: ContentNode, owner: &PageOwner, files: &[RemoteFile]) -> Vec<ContentNode> {
        let units = file_units(files, self.limits.max_files_per_page, self.strings);
        self.chain(continuation, owner, &units)
    }

    /// Page chain starting at `continuation`. The returned list is never
    /// empty; its first element is `continuation` (same id, possibly longer
    /// body) and its last element is where further content continues.
    pub fn chain(&self, continuation: ContentNode, owner: &PageOwner, units: &[String]) -> Vec<ContentNode> {
        let bodies = paginate(&continuation.body, &owner.base_body, units, self.limits.max_body_len);

        let mut pages = vec![continuation];
        let mut bodies = bodies.into_iter();
        match bodies.next() {
            Some(first) => pages[0].body = first,
            None => return pages,
        }

        for body in bodies {
            let previous = pages[pages.len() - 1].id;
            let mut entries = Vec::with_capacity(owner.entries.len() + 2);
            entries.push(Link::Back(BackMarker::previous_page(previous, &self.strings.previous_page)));
            entries.extend(owner.entries.iter().cloned());

            pages.push(ContentNode {
                id: self.ids.next_id(),
                label: self.strings.next_page.clone(),
                parent: Some(owner.id),
                body,
                entries,
            });
        }

        for index in 0..pages.len() - 1 {
            let next = pages[index + 1].id;
            pages[index].entries.push(Link::next_page(next));
        }
        for page in &mut pages {
            sort_entries(&mut page.entries);
        }
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::BackKind;

    fn limits(max_body_len: usize, max_files_per_page: usize) -> Limits {
        Limits {
            max_files_per_page,
            max_body_len,
        }
    }

    fn files(count: usize) -> Vec<RemoteFile> {
        (0..count)
            .map(|i| RemoteFile::new(format!("f{}", i), "application/pdf", format!("https://x/{}", i)))
            .collect()
    }

    #[test]
    fn test_chunk_chars_respects_char_boundaries() {
        assert_eq!(chunk_chars("ééééé", 2), vec!["éé", "éé", "é"]);
        assert!(chunk_chars("", 3).is_empty());
    }

    #[test]
    fn test_paginate_nothing_to_append() {
        assert!(paginate("base", "base", &[], 100).is_empty());
        assert!(paginate("base", "base", &[String::new()], 100).is_empty());
    }

    #[test]
    fn test_paginate_small_unit_stays_on_first_page() {
        let bodies = paginate("base", "base", &["hello".to_string()], 100);
        assert_eq!(bodies, vec!["base\n\nhello".to_string()]);
    }

    #[test]
    fn test_paginate_oversized_unit_is_split() {
        let unit = "A".repeat(150);
        let bodies = paginate("Main", "Main", &[unit.clone()], 100);

        assert_eq!(bodies.len(), 2);
        for body in &bodies {
            assert!(body.chars().count() <= 100);
            assert!(body.starts_with("Main\n\n"));
        }
        // lossless
        let joined: String = bodies.iter().map(|b| &b["Main\n\n".len()..]).collect();
        assert_eq!(joined, unit);
    }

    #[test]
    fn test_paginate_continuation_without_room_opens_new_page() {
        let continuation = format!("base\n\n{}", "x".repeat(90));
        let bodies = paginate(&continuation, "base", &["y".repeat(20)], 100);

        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[0], continuation);
        assert_eq!(bodies[1], format!("base\n\n{}", "y".repeat(20)));
    }

    #[test]
    fn test_paginate_base_without_room_drops_header() {
        let base = "b".repeat(99);
        let bodies = paginate(&base, &base, &["z".repeat(150)], 100);

        assert_eq!(bodies[0], base);
        assert_eq!(bodies[1], "z".repeat(100));
        assert_eq!(bodies[2], "z".repeat(50));
    }

    #[test]
    fn test_paginate_oversized_header_is_split() {
        let base = "h".repeat(45);
        let bodies = paginate(&base, &base, &[], 20);
        assert_eq!(bodies, vec!["h".repeat(20), "h".repeat(20), "h".repeat(5)]);

        let bodies = paginate(&base, &base, &["xyz".to_string()], 20);
        assert_eq!(bodies.last().map(String::as_str), Some("hhhhh\n\nxyz"));
        assert!(bodies.iter().all(|b| b.chars().count() <= 20));
    }

    #[test]
    fn test_text_units_sorted_by_page_number() {
        let items = vec![
            RemoteItem::text_page(2, "c"),
            RemoteItem::folder("Songs", "songs"),
            RemoteItem::text_page(0, "a"),
            RemoteItem::text_page(1, "b"),
        ];
        assert_eq!(text_units(&items), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_thirteen_files_make_three_batches() {
        let units = file_units(&files(13), 6, &Strings::default());
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].lines().count(), 6);
        assert_eq!(units[1].lines().count(), 6);
        assert_eq!(units[2].lines().count(), 1);
        assert!(units[0].starts_with("• [f0](https://x/0)\n"));
    }

    #[test]
    fn test_chain_links_pages() {
        let ids = IdAllocator::starting_at(100);
        let strings = Strings::default();
        let paginator = Paginator::new(&ids, &strings, limits(4096, 6));

        let mut owner_node = ContentNode::new(NodeId(1), "Songs", Some(NodeId(0)), "Songs");
        owner_node.entries = vec![Link::Back(BackMarker::parent(NodeId(0), "Back"))];
        let owner = PageOwner::of(&owner_node);

        let pages = paginator.file_chain(owner_node, &owner, &files(13));
        assert_eq!(pages.len(), 3);
        assert_eq!(pages[0].id, NodeId(1));
        assert_eq!(pages[1].id, NodeId(100));
        assert_eq!(pages[2].id, NodeId(101));

        for k in 0..pages.len() - 1 {
            assert_eq!(pages[k].next_page(), Some(pages[k + 1].id));
            assert_eq!(pages[k + 1].previous_page(), Some(pages[k].id));
            assert_eq!(pages[k + 1].parent, Some(NodeId(1)));
            assert_eq!(pages[k + 1].label, strings.next_page);
        }
        assert_eq!(pages[2].next_page(), None);
        assert_eq!(pages[0].previous_page(), None);

        // inherited parent back-link stays last
        for page in &pages {
            assert!(page.entries.last().unwrap().is_back(BackKind::Parent));
        }
        assert!(pages[1].entries[0].is_back(BackKind::PreviousPage));
        assert_eq!(pages[1].entries[1], Link::next_page(NodeId(101)));
    }

    #[test]
    fn test_single_page_chain_returns_continuation() {
        let ids = IdAllocator::new();
        let strings = Strings::default();
        let paginator = Paginator::new(&ids, &strings, limits(4096, 6));

        let node = ContentNode::root(NodeId(0), "Main");
        let owner = PageOwner::of(&node);
        let pages = paginator.text_chain(node, &owner, &[]);

        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].body, "Main");
        assert_eq!(ids.peek(), NodeId(0));
    }
}
