//! Social network clients and extractors used by Reelcap.
//!
//! Only Instagram is implemented: URL validation, shortcode extraction, the
//! fetch client, and the caption extraction pipeline live under
//! [`instagram`].
pub mod instagram;
