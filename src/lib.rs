mod assemble;
pub mod batch;
mod classify;
pub mod config;
pub mod convert;
mod docx;
mod error;
pub mod events;
mod images;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod report;
mod style;
mod wordcount;

pub use assemble::{Assembler, Assembly, AuthorText, DEFAULT_AUTHOR, DEFAULT_AUTHOR_LINE};
pub use classify::{Classifier, ClassifierOptions, DEFAULT_ID_PREFIX, find_author, heading_level};
pub use docx::{BlobSource, Package};
pub use error::{Error, Result};
pub use images::{ImageMapper, map_images};
pub use style::{IMAGE_WIDTH_PT, format_for, template_styles};
pub use wordcount::{WordStats, count_words, document_stats};
