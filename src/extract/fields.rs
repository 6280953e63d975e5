use scraper::{ElementRef, Html, Selector};

use super::image::{is_image_url, normalize_image_url};
use super::platform::Platform;
use super::price::{normalize_price, parse_plain};
use super::profile::{SiteProfile, SiteTable};
use super::types::{ExtractionResult, Outcome};

const MAX_TITLE_CHARS: usize = 100;

type TitleTier = fn(&Html, &SiteProfile) -> Option<String>;
type PriceTier = fn(&Html, &SiteProfile) -> Option<f64>;
type ImageTier = fn(&Html, &SiteProfile, &str) -> Option<String>;

// Each field is an ordered cascade; the first tier returning Some wins.
const TITLE_TIERS: &[TitleTier] = &[title_from_selectors, title_from_page_title, title_from_default];
const PRICE_TIERS: &[PriceTier] = &[price_from_meta, price_from_selectors, price_from_text];
const IMAGE_TIERS: &[ImageTier] = &[image_from_elements, image_from_meta];

/// Pure: never fails, only reports `Success` or `NotFound`.
pub fn extract_with(table: &SiteTable, url: &str, html: &str, platform: Platform) -> ExtractionResult {
    let doc = Html::parse_document(html);
    let profile = table.profile(platform);

    let title = TITLE_TIERS.iter().find_map(|tier| tier(&doc, profile)).unwrap_or_default();
    let price = PRICE_TIERS.iter().find_map(|tier| tier(&doc, profile)).unwrap_or(0.0);
    let image_url = IMAGE_TIERS.iter().find_map(|tier| tier(&doc, profile, url)).unwrap_or_default();

    // Both are required; a title without a price is still a miss.
    let outcome = if !title.is_empty() && price > 0.0 { Outcome::Success } else { Outcome::NotFound };

    ExtractionResult { title, price, image_url, platform, outcome }
}

// ---- title ----

fn title_from_selectors(doc: &Html, profile: &SiteProfile) -> Option<String> {
    profile.title_selectors.iter().find_map(|sel| {
        select_all(doc, sel)
            .into_iter()
            .map(|el| clean_title(&element_text(el), profile))
            .find(|t| !t.is_empty())
    })
}

fn title_from_page_title(doc: &Html, profile: &SiteProfile) -> Option<String> {
    select_all(doc, "title")
        .into_iter()
        .map(|el| clean_title(&element_text(el), profile))
        .find(|t| !t.is_empty())
}

fn title_from_default(_doc: &Html, profile: &SiteProfile) -> Option<String> {
    let t = profile.default_title.trim();
    if t.is_empty() { None } else { Some(truncate_chars(t, MAX_TITLE_CHARS)) }
}

fn clean_title(raw: &str, profile: &SiteProfile) -> String {
    let mut out = collapse_whitespace(raw);
    for suffix in &profile.title_suffixes {
        out = suffix.replace_all(&out, "").into_owned();
    }
    truncate_chars(out.trim(), MAX_TITLE_CHARS)
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].trim_end().to_string(),
        None => s.to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    let mut buf = String::with_capacity(s.len());
    let mut in_ws = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !in_ws {
                if !buf.is_empty() { buf.push(' '); }
                in_ws = true;
            }
        } else {
            buf.push(ch);
            in_ws = false;
        }
    }
    buf.trim().to_string()
}

// ---- price ----

fn price_from_meta(doc: &Html, profile: &SiteProfile) -> Option<f64> {
    profile.price_meta.iter().find_map(|sel| {
        select_all(doc, sel)
            .into_iter()
            .find_map(|el| el.value().attr("content").and_then(parse_plain))
    })
}

fn price_from_selectors(doc: &Html, profile: &SiteProfile) -> Option<f64> {
    profile.price_selectors.iter().find_map(|sel| {
        select_all(doc, sel)
            .into_iter()
            .find_map(|el| normalize_price(element_text(el).trim()))
    })
}

// Last resort: scan all text, inline scripts included. Only the first hit of
// each pattern counts; a non-positive hit moves on to the next pattern.
fn price_from_text(doc: &Html, profile: &SiteProfile) -> Option<f64> {
    if profile.price_patterns.is_empty() { return None; }
    let text = doc.root_element().text().collect::<String>();
    profile.price_patterns.iter().find_map(|re| {
        re.captures(&text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| parse_plain(m.as_str()))
    })
}

// ---- image ----

fn image_from_elements(doc: &Html, profile: &SiteProfile, base_url: &str) -> Option<String> {
    profile.image_selectors.iter().find_map(|sel| {
        select_all(doc, sel).into_iter().find_map(|el| {
            profile
                .image_attrs
                .iter()
                .filter_map(|attr| el.value().attr(attr))
                .find_map(|src| validated_image(src, base_url))
        })
    })
}

fn image_from_meta(doc: &Html, profile: &SiteProfile, base_url: &str) -> Option<String> {
    profile.image_meta.iter().find_map(|sel| {
        select_all(doc, sel)
            .into_iter()
            .find_map(|el| el.value().attr("content").and_then(|src| validated_image(src, base_url)))
    })
}

fn validated_image(src: &str, base_url: &str) -> Option<String> {
    let full = normalize_image_url(src, base_url);
    if is_image_url(&full) { Some(full) } else { None }
}

// ---- dom helpers ----

// Unparseable selectors count as "no match".
fn select_all<'a>(doc: &'a Html, selector: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(selector) {
        Ok(sel) => doc.select(&sel).collect(),
        Err(_) => Vec::new(),
    }
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SiteTable { SiteTable::builtin().unwrap() }

    #[test]
    fn taobao_selector_price_without_meta() {
        let html = r#"
        <html><head><title>Ignored - 淘宝网</title></head><body>
          <div id="J_Title"><h3 class="tb-main-title">  Wireless
             Mouse   M330 </h3></div>
          <em class="tb-rmb-num">¥1,299.00</em>
          <img id="J_ImgBooth" src="//img.alicdn.com/imgextra/i1/mouse.jpg">
        </body></html>
        "#;
        let url = "https://item.taobao.com/item.htm?id=1";
        let r = extract_with(&table(), url, html, Platform::Taobao);
        assert_eq!(r.title, "Wireless Mouse M330");
        assert_eq!(r.price, 1299.0);
        assert_eq!(r.image_url, "https://img.alicdn.com/imgextra/i1/mouse.jpg");
        assert_eq!(r.outcome, Outcome::Success);
    }

    #[test]
    fn meta_price_beats_selectors() {
        let html = r#"
        <html><head>
          <meta property="og:product:price" content="88.50">
        </head><body>
          <h1 data-spm="x">Desk Lamp</h1>
          <span class="tb-rmb-num">¥99.00</span>
        </body></html>
        "#;
        let r = extract_with(&table(), "https://item.taobao.com/item.htm", html, Platform::Taobao);
        assert_eq!(r.price, 88.5);
        assert_eq!(r.title, "Desk Lamp");
    }

    #[test]
    fn page_title_suffix_is_stripped() {
        let html = r#"<html><head><title>
            Mechanical Keyboard   87 keys -   淘宝网
        </title></head><body><p>价格：256.00</p></body></html>"#;
        let r = extract_with(&table(), "https://item.taobao.com/item.htm", html, Platform::Taobao);
        assert_eq!(r.title, "Mechanical Keyboard 87 keys");
        assert_eq!(r.price, 256.0);
        assert!(r.is_success());
    }

    #[test]
    fn jd_price_from_inline_script() {
        let html = r#"
        <html><head><title>Headphones【行情 报价】-京东</title></head><body>
          <div class="sku-name">Noise Cancelling Headphones</div>
          <script>var pageConfig = { product: { skuid: 1, price: "1499.00" } };</script>
          <img id="spec-img" data-origin="//img14.360buyimg.com/n1/h.jpg" src="/blank.gif">
        </body></html>
        "#;
        let r = extract_with(&table(), "https://item.jd.com/1.html", html, Platform::Jd);
        assert_eq!(r.title, "Noise Cancelling Headphones");
        assert_eq!(r.price, 1499.0);
        assert_eq!(r.image_url, "https://img14.360buyimg.com/n1/h.jpg");
    }

    #[test]
    fn lazy_attribute_used_when_src_is_not_an_image() {
        let html = r#"
        <html><body>
          <h1 data-spm="t">Tea Set</h1><span class="tm-price">128.00</span>
          <div class="tb-booth"><img src="javascript:void(0)" data-ks-lazyload="//gd1.alicdn.com/bao/tea.png"></div>
        </body></html>
        "#;
        let r = extract_with(&table(), "https://detail.tmall.com/item.htm", html, Platform::Tmall);
        assert_eq!(r.image_url, "https://gd1.alicdn.com/bao/tea.png");
    }

    #[test]
    fn og_image_fallback_is_resolved() {
        let html = r#"
        <html><head>
          <title>Garden Chair</title>
          <meta property="product:price:amount" content="45.00">
          <meta property="og:image" content="/static/images/chair.webp">
        </head><body></body></html>
        "#;
        let r = extract_with(&table(), "https://shop.example.com/p/9", html, Platform::Other);
        assert_eq!(r.title, "Garden Chair");
        assert_eq!(r.price, 45.0);
        assert_eq!(r.image_url, "https://shop.example.com/static/images/chair.webp");
    }

    #[test]
    fn title_without_price_is_not_found() {
        let html = r#"<html><head><title>Rendered by JS</title></head><body><div id="app"></div></body></html>"#;
        let r = extract_with(&table(), "https://item.jd.com/2.html", html, Platform::Jd);
        assert_eq!(r.title, "Rendered by JS");
        assert_eq!(r.price, 0.0);
        assert_eq!(r.image_url, "");
        assert_eq!(r.outcome, Outcome::NotFound);
    }

    #[test]
    fn default_title_applies_when_page_has_none() {
        let html = r#"<html><body><span>￥ 19.9</span></body></html>"#;
        let r = extract_with(&table(), "https://mobile.yangkeduo.com/goods.html", html, Platform::Pdd);
        assert_eq!(r.title, "拼多多商品");
        assert_eq!(r.price, 19.9);
        assert!(r.is_success());
    }

    #[test]
    fn long_titles_are_truncated_on_char_boundary() {
        let long = "商".repeat(150);
        let html = format!("<html><head><title>{long}</title><meta property=\"product:price\" content=\"1\"></head></html>");
        let r = extract_with(&table(), "https://x.example.org/", &html, Platform::Other);
        assert_eq!(r.title.chars().count(), 100);
    }

    #[test]
    fn broken_selector_in_table_is_skipped() {
        let t = SiteTable::from_json(r#"{"other": {"title_selectors": ["h1[[["], "price_selectors": [".p"]}}"#).unwrap();
        let html = r#"<html><head><title>Fallback</title></head><body><span class="p">$12</span></body></html>"#;
        let r = extract_with(&t, "https://x.example.org/", html, Platform::Other);
        assert_eq!(r.title, "Fallback");
        assert_eq!(r.price, 12.0);
    }

    #[test]
    fn text_scan_takes_first_hit_per_pattern() {
        let html = r#"<html><body><p>运费 ¥0 现价 ¥99</p></body></html>"#;
        let r = extract_with(&table(), "https://shop.example.com/p/1", html, Platform::Other);
        assert_eq!(r.price, 0.0);
        assert_eq!(r.outcome, Outcome::NotFound);

        let html = r#"<html><body><p>运费 ¥0 现价 price: 99</p></body></html>"#;
        let r = extract_with(&table(), "https://shop.example.com/p/1", html, Platform::Other);
        assert_eq!(r.price, 99.0);
    }

    #[test]
    fn empty_document_is_not_found() {
        let r = extract_with(&table(), "https://item.taobao.com/", "", Platform::Taobao);
        assert_eq!(r.title, "");
        assert_eq!(r.outcome, Outcome::NotFound);
    }
}
