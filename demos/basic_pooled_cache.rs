use std::mem::size_of;

use poolcache::builder::CacheBuilder;
use poolcache::entry::{FromKey, KeyProvider, Variant};
use poolcache::error::CacheError;

struct Thumbnail {
    name: &'static str,
    pixels: [u8; 16],
}

struct Document {
    name: &'static str,
    words: [u32; 16],
}

enum Asset {
    Thumbnail(Thumbnail),
    Document(Document),
}

impl KeyProvider<&'static str> for Asset {
    fn key(&self) -> &&'static str {
        match self {
            Asset::Thumbnail(t) => &t.name,
            Asset::Document(d) => &d.name,
        }
    }
}

impl Variant<Asset> for Thumbnail {
    fn wrap(self) -> Asset {
        Asset::Thumbnail(self)
    }
    fn as_variant(asset: &Asset) -> Option<&Self> {
        match asset {
            Asset::Thumbnail(t) => Some(t),
            Asset::Document(_) => None,
        }
    }
    fn as_variant_mut(asset: &mut Asset) -> Option<&mut Self> {
        match asset {
            Asset::Thumbnail(t) => Some(t),
            Asset::Document(_) => None,
        }
    }
}

impl Variant<Asset> for Document {
    fn wrap(self) -> Asset {
        Asset::Document(self)
    }
    fn as_variant(asset: &Asset) -> Option<&Self> {
        match asset {
            Asset::Document(d) => Some(d),
            Asset::Thumbnail(_) => None,
        }
    }
    fn as_variant_mut(asset: &mut Asset) -> Option<&mut Self> {
        match asset {
            Asset::Document(d) => Some(d),
            Asset::Thumbnail(_) => None,
        }
    }
}

impl FromKey<&'static str> for Thumbnail {
    fn from_key(name: &&'static str) -> Self {
        Thumbnail {
            name: *name,
            pixels: [name.len() as u8; 16],
        }
    }
}

impl FromKey<&'static str> for Document {
    fn from_key(name: &&'static str) -> Self {
        Document {
            name: *name,
            words: [name.len() as u32; 16],
        }
    }
}

fn main() -> Result<(), CacheError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut cache = CacheBuilder::new(2)
        .size_classes([size_of::<Thumbnail>(), size_of::<Document>()])
        .build::<&'static str, Asset>();

    cache.get::<Thumbnail>(&"logo")?;
    cache.get::<Document>(&"readme")?;
    println!("logo pixel: {}", cache.get::<Thumbnail>(&"logo")?.pixels[0]);

    cache.get::<Thumbnail>(&"icon")?;
    cache.get::<Thumbnail>(&"banner")?;

    println!("contains readme? {}", cache.contains(&"readme"));
    println!(
        "logo lookup: {:?}",
        cache.get::<Thumbnail>(&"logo").map(|t| t.name)
    );
    if let Some(doc) = cache.peek::<Document>(&"logo") {
        println!("unexpected document: {}", doc.words[0]);
    }
    print!("{}", cache);

    Ok(())
}

// Expected output:
// logo pixel: 4
// contains readme? false
// logo lookup: Ok("logo")
// Priority: ["logo"]
// Regular: ["banner", "icon"]
//
// Explanation: both segments hold 2. The second lookup of "logo" promotes it
// to the protected segment. "icon" fills the probationary segment and
// "banner" evicts its oldest entry, "readme". peek never constructs, and
// "logo" is a thumbnail, so the document peek finds nothing.
//
// Run with RUST_LOG=poolcache=trace to see promotions and evictions.
