mod media;

pub use media::{
    AnimeDetails, MangaDetails, MediaKind, NormalizedMedia, Provider, normalize_string,
    unique_strings,
};
