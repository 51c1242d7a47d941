mod channels;
mod products;

pub use channels::{tone_options, Network, Tone, ToneOption};
pub use products::{AngleCopy, Catalog, MessagingAngle, Product, ProductCategory};
