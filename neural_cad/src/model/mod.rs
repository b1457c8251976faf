//! Generation pipeline: decoder and tokenizer seams, greedy decoding and
//! program extraction.

pub mod decoder;
pub mod extract;
pub mod pipeline;
pub mod tokenizer;

pub use decoder::{CausalDecoder, DecoderOutput};
pub use extract::extract_program;
pub use pipeline::{points_to_tensor, CadRecode, GeneratedProgram};
pub use tokenizer::{load_tokenizer, Tokenizer, VocabTokenizer};
