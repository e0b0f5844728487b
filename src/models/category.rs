//! Fixed category label sets for each item kind.

use super::ItemKind;

/// Sentinel meaning "no category filter". Never stored on an item.
pub const ALL_CATEGORY: &str = "all";

/// Localized spelling of the sentinel used by the Arabic file listing.
const ALL_CATEGORY_AR: &str = "الكل";

/// Categories offered for uploaded files.
pub const FILE_CATEGORIES: &[&str] = &[
    "تصميم",
    "أدوات النظام",
    "برمجة",
    "وسائط",
    "ألعاب",
    "مكتبية",
];

/// Categories offered for listed bots.
pub const BOT_CATEGORIES: &[&str] = &["Music", "Moderation", "Economy", "Fun", "Utility", "Gaming"];

/// Category labels for a kind, without the sentinel.
pub fn categories_for(kind: ItemKind) -> &'static [&'static str] {
    match kind {
        ItemKind::File => FILE_CATEGORIES,
        ItemKind::Bot => BOT_CATEGORIES,
    }
}

/// True if `label` is the "all" sentinel in any accepted spelling.
pub fn is_all_sentinel(label: &str) -> bool {
    label.eq_ignore_ascii_case(ALL_CATEGORY) || label == ALL_CATEGORY_AR
}

/// True if `label` is a storable category for `kind`.
pub fn is_known(kind: ItemKind, label: &str) -> bool {
    categories_for(kind).contains(&label)
}
