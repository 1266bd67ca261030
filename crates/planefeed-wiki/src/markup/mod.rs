//! Wiki markup handling: cleanup, template expansion, infobox fields.

pub mod infobox;
pub mod normalize;
pub mod templates;

pub use infobox::{FieldKind, blocks_in_order, extract_field, find_blocks, raw_field};
pub use normalize::{collapse_whitespace, is_residue, normalize};
pub use templates::TemplateResolver;
