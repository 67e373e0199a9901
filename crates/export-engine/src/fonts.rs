//! Best-effort caption font lookup.
//!
//! Captions may carry CJK player and action names, so the lookup
//! targets a CJK-capable family per platform. Absence is a normal,
//! handled case: ffmpeg falls back to its default font and the export
//! proceeds.

use std::path::{Path, PathBuf};

use matchcut_clip_core::FontPaths;

/// Platform font lookup seam. Implementations return a path only when
/// the file actually exists.
pub trait FontResolver: Send + Sync {
    fn resolve(&self, bold: bool) -> Option<PathBuf>;

    fn name(&self) -> &str;
}

/// Static per-OS candidate lists, first existing path wins.
pub struct PlatformFontResolver;

impl PlatformFontResolver {
    // The Hiragino collection carries both weights.
    #[cfg(target_os = "macos")]
    fn candidates(_bold: bool) -> &'static [&'static str] {
        &[
            "/System/Library/Fonts/Hiragino Sans GB.ttc",
            "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
        ]
    }

    #[cfg(target_os = "windows")]
    fn candidates(bold: bool) -> &'static [&'static str] {
        if bold {
            &[
                "C:\\Windows\\Fonts\\YuGothB.ttc",
                "C:\\Windows\\Fonts\\meiryob.ttc",
                "C:\\Windows\\Fonts\\msgothic.ttc",
            ]
        } else {
            &[
                "C:\\Windows\\Fonts\\YuGothR.ttc",
                "C:\\Windows\\Fonts\\meiryo.ttc",
                "C:\\Windows\\Fonts\\msgothic.ttc",
            ]
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    fn candidates(bold: bool) -> &'static [&'static str] {
        if bold {
            &[
                "/usr/share/fonts/opentype/noto/NotoSansCJK-Bold.ttc",
                "/usr/share/fonts/noto-cjk/NotoSansCJK-Bold.ttc",
                "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
            ]
        } else {
            &[
                "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
                "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
            ]
        }
    }
}

impl FontResolver for PlatformFontResolver {
    fn resolve(&self, bold: bool) -> Option<PathBuf> {
        Self::candidates(bold)
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    fn name(&self) -> &str {
        "platform"
    }
}

/// Resolve both weights once at request start.
pub fn resolve_fonts(resolver: &dyn FontResolver) -> FontPaths {
    let fonts = FontPaths {
        bold: resolver.resolve(true),
        regular: resolver.resolve(false),
    };
    if fonts.bold.is_none() && fonts.regular.is_none() {
        tracing::debug!(
            resolver = resolver.name(),
            "No caption font found; captions use the transcoder default"
        );
    }
    fonts
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoFonts;
    impl FontResolver for NoFonts {
        fn resolve(&self, _bold: bool) -> Option<PathBuf> {
            None
        }
        fn name(&self) -> &str {
            "none"
        }
    }

    #[test]
    fn test_absent_fonts_are_not_an_error() {
        let fonts = resolve_fonts(&NoFonts);
        assert!(fonts.bold.is_none());
        assert!(fonts.regular.is_none());
    }

    #[test]
    fn test_platform_resolver_only_returns_existing_paths() {
        let resolver = PlatformFontResolver;
        for bold in [true, false] {
            if let Some(path) = resolver.resolve(bold) {
                assert!(path.exists());
            }
        }
    }
}
