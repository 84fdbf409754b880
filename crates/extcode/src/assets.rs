//! Stylesheet and script shipped with the extension.

use extcode_doc::StaticAsset;

#[derive(rust_embed::RustEmbed)]
#[folder = "static/"]
struct Static;

/// Embedded assets, sorted by file name.
#[must_use]
pub fn static_assets() -> Vec<StaticAsset> {
    let mut assets: Vec<StaticAsset> = Static::iter()
        .filter_map(|name| {
            Static::get(&name).map(|file| StaticAsset {
                name: name.into_owned(),
                data: file.data,
            })
        })
        .collect();
    assets.sort_by(|a, b| a.name.cmp(&b.name));
    assets
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_static_assets() {
        let assets = static_assets();
        let names: Vec<&str> = assets.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["extcode.css", "extcode.js"]);

        let script = String::from_utf8_lossy(&assets[1].data);
        assert!(script.contains(".extcode.extcode-layout-toggle"));
        assert!(script.contains("extcode-hover"));
    }
}
