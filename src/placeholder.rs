//! Reserved literals written in place of content a human still has to supply.

/// A label that needs (re)translation.
pub const TRANSLATION_NEEDED: &str = "TODO_Translation_Needed";

/// A translated label whose upstream counterpart is gone; a human must confirm the removal.
pub const TRANSLATION_DELETE_NEEDED: &str = "TODO_Translation_Delete_Needed";

/// A label referenced by a map but missing from the string table.
pub const MISSING_LABEL: &str = "TODO_Missing_Label";

