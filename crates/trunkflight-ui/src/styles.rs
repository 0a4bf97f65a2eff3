//! Ayu color theme and styling functions for tf output.
//!
//! Only things the user acts on get color: commit hashes, branch names,
//! sandbox paths and outcome markers. Everything else is plain text, and all
//! helpers fall back to plain text when color is disabled.

use owo_colors::OwoColorize;
use trunkflight_core::SimpleCommit;

use crate::terminal::supports_color;

// ---------------------------------------------------------------------------
// Ayu Dark color palette (RGB values)
// ---------------------------------------------------------------------------

const PASS: (u8, u8, u8) = (0xc2, 0xd9, 0x4c); // #c2d94c - bright green
const WARN: (u8, u8, u8) = (0xff, 0xb4, 0x54); // #ffb454 - bright yellow
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80); // #6c7680 - muted gray
const ACCENT: (u8, u8, u8) = (0x59, 0xc2, 0xff); // #59c2ff - bright blue
const HASH: (u8, u8, u8) = (0xe6, 0xb4, 0x50); // #e6b450 - muted gold
const BRANCH: (u8, u8, u8) = (0xd2, 0xa6, 0xff); // #d2a6ff - purple

// ---------------------------------------------------------------------------
// Icons
// ---------------------------------------------------------------------------

pub const ICON_PASS: &str = "\u{2713}"; // check mark
pub const ICON_WARN: &str = "\u{26A0}"; // warning sign
pub const ICON_INFO: &str = "\u{2139}"; // info

/// Tree glyph for the last child of a group.
pub const TREE_LAST: &str = "\u{2514}\u{2500} ";
/// Tree glyph for a non-last child of a group.
pub const TREE_CHILD: &str = "\u{251C}\u{2500} ";

// ---------------------------------------------------------------------------
// Helper: apply truecolor only when color is supported
// ---------------------------------------------------------------------------

fn color_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    } else {
        s.to_string()
    }
}

fn color_bold_str(s: &str, rgb: (u8, u8, u8)) -> String {
    if supports_color() {
        s.truecolor(rgb.0, rgb.1, rgb.2).bold().to_string()
    } else {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Semantic render helpers
// ---------------------------------------------------------------------------

pub fn render_muted(s: &str) -> String {
    color_str(s, MUTED)
}

pub fn render_accent(s: &str) -> String {
    color_str(s, ACCENT)
}

/// Renders a section header in bold accent.
pub fn render_header(s: &str) -> String {
    color_bold_str(s, ACCENT)
}

pub fn render_pass_icon() -> String {
    color_str(ICON_PASS, PASS)
}

pub fn render_warn_icon() -> String {
    color_str(ICON_WARN, WARN)
}

pub fn render_info_icon() -> String {
    color_str(ICON_INFO, ACCENT)
}

// ---------------------------------------------------------------------------
// Domain rendering
// ---------------------------------------------------------------------------

pub fn render_hash(hash: &str) -> String {
    color_str(hash, HASH)
}

pub fn render_branch(name: &str) -> String {
    color_str(name, BRANCH)
}

/// `<hash> <message>` with the hash highlighted.
pub fn render_commit(commit: &SimpleCommit) -> String {
    format!(
        "{} {}",
        render_hash(&commit.short_hash),
        commit.short_message
    )
}

/// Tree prefix for item `index` of `len` children.
pub fn tree_prefix(index: usize, len: usize) -> String {
    let glyph = if index + 1 == len { TREE_LAST } else { TREE_CHILD };
    render_muted(glyph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_commit_contains_fields() {
        let c = SimpleCommit::new("0123456789abcdef", "Fix the widget");
        let rendered = render_commit(&c);
        assert!(rendered.contains("0123456"));
        assert!(rendered.contains("Fix the widget"));
    }

    #[test]
    fn tree_prefix_marks_last_child() {
        assert!(tree_prefix(1, 2).contains(TREE_LAST));
        assert!(tree_prefix(0, 2).contains(TREE_CHILD));
    }

    #[test]
    fn helpers_keep_text() {
        // Color may or may not be enabled in the test environment.
        assert!(render_branch("main").contains("main"));
        assert!(render_accent("ok").contains("ok"));
        assert!(render_header("Repos").contains("Repos"));
    }
}
