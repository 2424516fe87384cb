//! # pictext
//!
//! Turns base64 images into text. Each image is classified zero-shot against a
//! fixed table of candidate labels and routed by category:
//!
//! - **Text**: OCR (Tesseract, Clova or Azure), fragments joined by spaces
//! - **Formula**: LaTeX from a vision model, wrapped as `$...$`
//! - **Graph** (and anything unrecognized): a short caption from Gemini
//!
//! Failures never surface as errors from [`Dispatcher::convert`]: an
//! undecodable payload yields no result, and any later failure hands back the
//! original input.
//!
//! ## Quick Start
//!
//! ```ignore
//! use pictext::prelude::*;
//!
//! // Build every collaborator once at startup
//! let dispatcher = settings.build_dispatcher()?;
//!
//! match dispatcher.convert(&encoded).await {
//!     Conversion::Extracted { category, text, .. } => println!("{category}: {text}"),
//!     Conversion::Degraded { error, .. } => eprintln!("fell back to input: {error}"),
//!     Conversion::Rejected(e) => eprintln!("not an image: {e}"),
//! }
//!
//! // The LaTeX cleanup is usable on its own
//! assert_eq!(convert_text_to_latex(r"x=1\, ."), "$x=1$");
//! ```

pub mod captioner;
pub mod category;
pub mod classifier;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod formula;
pub mod image_loader;
pub mod text_extractor;

// Re-export commonly used types at the root level
pub use captioner::{Captioner, GeminiCaptioner};
pub use category::{Category, CategoryTable};
pub use classifier::{select_best, Classification, Classifier, ClipClassifier};
pub use config::{OcrEngineKind, Settings};
pub use dispatcher::{categorize, CategorizedLabel, Collaborators, Conversion, ConversionReport, Dispatcher};
pub use error::{ClassifyError, ConvertError, ExtractError};
pub use formula::{convert_text_to_latex, FormulaExtractor, VlmFormulaExtractor};
pub use image_loader::{decode_base64_image, encode_image_file, DecodedImage, ImageError};
pub use text_extractor::{OcrTextExtractor, TextExtractor};

/// Prelude module for convenient imports
///
/// Import everything you need with:
/// ```ignore
/// use pictext::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        categorize, convert_text_to_latex, decode_base64_image, encode_image_file, select_best, Captioner,
        CategorizedLabel, Category, CategoryTable, Classification, Classifier, ClassifyError,
        ClipClassifier, Collaborators, Conversion, ConversionReport, ConvertError, DecodedImage,
        Dispatcher, ExtractError, FormulaExtractor, GeminiCaptioner, ImageError, OcrEngineKind,
        OcrTextExtractor, Settings, TextExtractor, VlmFormulaExtractor,
    };
}
