//! Filter identifiers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A set of filters. Ordered so listings and serialized output are stable.
pub type FilterSet = BTreeSet<Filter>;

/// A single, independently switchable rewrite filter.
///
/// The enumeration is closed. `Filter::ALL` spans the whole range from
/// `Filter::FIRST` to `Filter::LAST` in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Filter {
    AddHead,
    AddInstrumentation,
    CollapseWhitespace,
    CombineCss,
    CombineHeads,
    CombineJavascript,
    ConvertJpegToWebp,
    ConvertMetaTags,
    ConvertPngToJpeg,
    DeferJavascript,
    DelayImages,
    DivStructure,
    ElideAttributes,
    ExtendCache,
    FlattenCssImports,
    FlushHtml,
    InlineCss,
    InlineImages,
    InlineImportToLink,
    InlineJavascript,
    InsertImageDimensions,
    LazyloadImages,
    LeftTrimUrls,
    MakeGoogleAnalyticsAsync,
    MoveCssToHead,
    OutlineCss,
    OutlineJavascript,
    RecompressImages,
    RemoveComments,
    RemoveQuotes,
    ResizeImages,
    RewriteCss,
    RewriteDomains,
    RewriteJavascript,
    RewriteStyleAttributes,
    RewriteStyleAttributesWithUrl,
    SpriteImages,
    StripScripts,
}

impl Filter {
    /// Every filter, in declaration order.
    pub const ALL: [Filter; 38] = [
        Filter::AddHead,
        Filter::AddInstrumentation,
        Filter::CollapseWhitespace,
        Filter::CombineCss,
        Filter::CombineHeads,
        Filter::CombineJavascript,
        Filter::ConvertJpegToWebp,
        Filter::ConvertMetaTags,
        Filter::ConvertPngToJpeg,
        Filter::DeferJavascript,
        Filter::DelayImages,
        Filter::DivStructure,
        Filter::ElideAttributes,
        Filter::ExtendCache,
        Filter::FlattenCssImports,
        Filter::FlushHtml,
        Filter::InlineCss,
        Filter::InlineImages,
        Filter::InlineImportToLink,
        Filter::InlineJavascript,
        Filter::InsertImageDimensions,
        Filter::LazyloadImages,
        Filter::LeftTrimUrls,
        Filter::MakeGoogleAnalyticsAsync,
        Filter::MoveCssToHead,
        Filter::OutlineCss,
        Filter::OutlineJavascript,
        Filter::RecompressImages,
        Filter::RemoveComments,
        Filter::RemoveQuotes,
        Filter::ResizeImages,
        Filter::RewriteCss,
        Filter::RewriteDomains,
        Filter::RewriteJavascript,
        Filter::RewriteStyleAttributes,
        Filter::RewriteStyleAttributesWithUrl,
        Filter::SpriteImages,
        Filter::StripScripts,
    ];

    pub const FIRST: Filter = Filter::AddHead;
    pub const LAST: Filter = Filter::StripScripts;

    /// Position of this filter within `Filter::ALL`.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Canonical operator-facing name.
    ///
    /// Deprecated spellings also resolve through the catalog but are never
    /// produced here.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Filter::AddHead => "add_head",
            Filter::AddInstrumentation => "add_instrumentation",
            Filter::CollapseWhitespace => "collapse_whitespace",
            Filter::CombineCss => "combine_css",
            Filter::CombineHeads => "combine_heads",
            Filter::CombineJavascript => "combine_javascript",
            Filter::ConvertJpegToWebp => "convert_jpeg_to_webp",
            Filter::ConvertMetaTags => "convert_meta_tags",
            Filter::ConvertPngToJpeg => "convert_png_to_jpeg",
            Filter::DeferJavascript => "defer_javascript",
            Filter::DelayImages => "delay_images",
            Filter::DivStructure => "div_structure",
            Filter::ElideAttributes => "elide_attributes",
            Filter::ExtendCache => "extend_cache",
            Filter::FlattenCssImports => "flatten_css_imports",
            Filter::FlushHtml => "flush_html",
            Filter::InlineCss => "inline_css",
            Filter::InlineImages => "inline_images",
            Filter::InlineImportToLink => "inline_import_to_link",
            Filter::InlineJavascript => "inline_javascript",
            Filter::InsertImageDimensions => "insert_image_dimensions",
            Filter::LazyloadImages => "lazyload_images",
            Filter::LeftTrimUrls => "trim_urls",
            Filter::MakeGoogleAnalyticsAsync => "make_google_analytics_async",
            Filter::MoveCssToHead => "move_css_to_head",
            Filter::OutlineCss => "outline_css",
            Filter::OutlineJavascript => "outline_javascript",
            Filter::RecompressImages => "recompress_images",
            Filter::RemoveComments => "remove_comments",
            Filter::RemoveQuotes => "remove_quotes",
            Filter::ResizeImages => "resize_images",
            Filter::RewriteCss => "rewrite_css",
            Filter::RewriteDomains => "rewrite_domains",
            Filter::RewriteJavascript => "rewrite_javascript",
            Filter::RewriteStyleAttributes => "rewrite_style_attributes",
            Filter::RewriteStyleAttributesWithUrl => "rewrite_style_attributes_with_url",
            Filter::SpriteImages => "sprite_images",
            Filter::StripScripts => "strip_scripts",
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
