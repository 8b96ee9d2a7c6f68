//! Pipeline stages for building a score book.
//!
//! Each submodule implements exactly one step and is tested on its own.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ title ──▶ render ──▶ latex ──▶ typeset
//! (list)    (zip)       (XML)     (mscore)   (.tex)    (pdflatex ×2)
//! ```
//!
//! 1. [`input`]  : read the score list into ordered archive paths
//! 2. [`extract`]: unpack an archive into a scoped scratch directory and
//!    locate its single inner document
//! 3. [`title`]  : read the `workTitle` meta tag, falling back to the file stem
//! 4. [`render`] : run the external renderer, checking its exit status
//! 5. [`latex`]  : generate the `pdfpages` document with a contents entry per score
//! 6. [`typeset`]: run the LaTeX engine once per pass
//!
//! [`score`] chains steps 2–4 for one archive; [`tool`] wraps every external
//! process call.

pub mod extract;
pub mod input;
pub mod latex;
pub mod render;
pub mod score;
pub mod title;
pub mod tool;
pub mod typeset;
