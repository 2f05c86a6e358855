//! Integration tests for application-aware URL reversal.
//!
//! Tests cover: single and multi-language mounts, page slug narrowing,
//! generation bumps after content changes, the reverse cache with and
//! without the read bypass, prefix normalisation, lazy reversal, and the
//! template tags on top of a loaded fixture.

use articles_rs_app::models::{ActiveBindingFinder, ApplicationContentBinding, Article, Page};
use articles_rs_app::reverse::{cache_key, ReverseArgs, UrlconfSource};
use articles_rs_app::templatetags::Context;
use articles_rs_app::{AppConfig, ArticlesApp, Fixture};
use articles_rs_cache::{cycle_app_reverse_cache, CacheValue};
use articles_rs_core::i18n::LanguageOverride;
use articles_rs_core::{ArticlesError, Settings};
use serde_json::json;

fn app() -> ArticlesApp {
    let app = ArticlesApp::new(Settings::default()).unwrap();
    app.ready();
    app
}

fn detail(app: &ArticlesApp, slug: &str) -> Result<String, ArticlesError> {
    app.reverser().reverse(
        "article_detail",
        UrlconfSource::Path("articles.urls"),
        ReverseArgs::new().kwarg("slug", slug),
    )
}

fn two_language_app() -> ArticlesApp {
    let app = app();
    app.pages()
        .save(Page::new(1, "News", "news").language("en-us"))
        .unwrap();
    app.pages()
        .save(Page::new(2, "Nachrichten", "nachrichten").language("de"))
        .unwrap();
    app.bindings()
        .save(ApplicationContentBinding::new(1, 1, "articles.urls"))
        .unwrap();
    app.bindings()
        .save(ApplicationContentBinding::new(2, 2, "articles.urls"))
        .unwrap();
    app
}

// ═════════════════════════════════════════════════════════════════════
// 1. One active binding: prefix is the page URL in every language
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_single_binding_any_language() {
    let app = app();
    app.pages().save(Page::new(1, "Home", "home")).unwrap();
    app.pages()
        .save(Page::new(2, "Blog", "blog").parent(1).language("de"))
        .unwrap();
    app.bindings()
        .save(ApplicationContentBinding::new(7, 2, "articles.urls"))
        .unwrap();

    for language in ["en", "de", "fr-ca"] {
        let _guard = LanguageOverride::new(language);
        assert_eq!(detail(&app, "hello").unwrap(), "/home/blog/hello/");
    }
}

// ═════════════════════════════════════════════════════════════════════
// 2. Two languages: the active language picks the mount
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_two_languages_pick_by_short_code() {
    let app = two_language_app();
    {
        let _guard = LanguageOverride::new("en");
        assert_eq!(detail(&app, "a").unwrap(), "/news/a/");
    }
    {
        let _guard = LanguageOverride::new("de-at");
        assert_eq!(detail(&app, "a").unwrap(), "/nachrichten/a/");
    }
    {
        let _guard = LanguageOverride::new("it");
        assert_eq!(detail(&app, "a").unwrap(), "/news/a/");
    }
}

#[test]
fn test_page_slug_narrows_and_is_not_passed_on() {
    let app = two_language_app();
    let _guard = LanguageOverride::new("en");
    let url = app
        .reverser()
        .reverse(
            "article_detail",
            UrlconfSource::Path("articles.urls"),
            ReverseArgs::new().kwarg("slug", "a").page_slug("nachrichten"),
        )
        .unwrap();
    assert_eq!(url, "/nachrichten/a/");
}

#[test]
fn test_inactive_page_is_skipped() {
    let app = two_language_app();
    app.pages()
        .save(Page::new(1, "News", "news").language("en-us").active(false))
        .unwrap();
    let _guard = LanguageOverride::new("en");
    assert_eq!(detail(&app, "a").unwrap(), "/nachrichten/a/");
}

// ═════════════════════════════════════════════════════════════════════
// 3. Content changes bump the generation and reach the next reversal
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_slug_change_after_bump() {
    let app = app();
    app.pages().save(Page::new(1, "News", "news")).unwrap();
    app.bindings()
        .save(ApplicationContentBinding::new(1, 1, "articles.urls"))
        .unwrap();
    assert_eq!(detail(&app, "x").unwrap(), "/news/x/");
    let before = app.generation().current().unwrap().unwrap();

    app.pages().save(Page::new(1, "Press", "press")).unwrap();
    assert!(app.generation().current().unwrap().unwrap() > before);
    assert_eq!(detail(&app, "x").unwrap(), "/press/x/");
}

#[test]
fn test_cache_read_enabled_serves_until_bump() {
    let mut settings = Settings::default();
    settings.articles.bypass_reverse_cache = false;
    // No ready(): page saves do not bump the generation.
    let app = ArticlesApp::new(settings).unwrap();
    app.pages().save(Page::new(1, "News", "news")).unwrap();
    app.bindings()
        .save(ApplicationContentBinding::new(1, 1, "articles.urls"))
        .unwrap();

    assert_eq!(detail(&app, "x").unwrap(), "/news/x/");
    app.pages().save(Page::new(1, "Press", "press")).unwrap();
    assert_eq!(detail(&app, "x").unwrap(), "/news/x/");

    cycle_app_reverse_cache(app.generation().as_ref());
    assert_eq!(detail(&app, "x").unwrap(), "/press/x/");
}

#[test]
fn test_cache_written_even_when_read_is_bypassed() {
    let app = app();
    app.pages().save(Page::new(1, "News", "news")).unwrap();
    app.bindings()
        .save(ApplicationContentBinding::new(1, 1, "articles.urls"))
        .unwrap();
    detail(&app, "x").unwrap();

    let generation = app.generation().current().unwrap().unwrap();
    let key = cache_key("articles.urls", "en", 1, generation);
    match app.cache().get(&key).unwrap() {
        Some(CacheValue::Json(value)) => {
            assert_eq!(value, json!({"urlconf": "articles.urls", "prefix": "/news/"}));
        }
        other => panic!("unexpected cache entry {other:?}"),
    }
}

// ═════════════════════════════════════════════════════════════════════
// 4. Unknown urlconf
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_unknown_urlconf_is_no_reverse_match() {
    let app = app();
    let err = app
        .reverser()
        .reverse("index", UrlconfSource::Path("shop.urls"), ReverseArgs::new())
        .unwrap_err();
    assert!(err.is_no_reverse_match());
    assert!(err.to_string().contains("shop.urls"));
}

#[test]
fn test_unknown_urlconf_in_tag_with_as_var() {
    let app = app();
    let mut ctx = Context::new();
    let out = app
        .article_tags()
        .render("{% articles_app_reverse 'index' 'shop.urls' as shop_url %}", &mut ctx)
        .unwrap();
    assert_eq!(out, "");
    assert_eq!(ctx.get("shop_url"), Some(&json!("")));
}

#[test]
fn test_lazy_reverse_is_deferred() {
    let app = app();
    let lazy = app
        .reverser()
        .reverse_lazy("article_detail", "articles.urls", ReverseArgs::new().kwarg("slug", "x"));

    app.pages().save(Page::new(1, "News", "news")).unwrap();
    app.bindings()
        .save(ApplicationContentBinding::new(1, 1, "articles.urls"))
        .unwrap();
    assert_eq!(lazy.to_string(), "/news/x/");

    let missing = app
        .reverser()
        .reverse_lazy("index", "shop.urls", ReverseArgs::new());
    assert!(missing.force().is_err());
    assert_eq!(missing.to_string(), "");
}

#[test]
fn test_lazy_reverse_follows_generation_bump() {
    let mut settings = Settings::default();
    settings.articles.bypass_reverse_cache = false;
    let app = ArticlesApp::new(settings).unwrap();
    app.ready();
    app.pages().save(Page::new(1, "News", "news")).unwrap();
    app.bindings()
        .save(ApplicationContentBinding::new(1, 1, "articles.urls"))
        .unwrap();

    let lazy = app
        .reverser()
        .reverse_lazy("article_index", "articles.urls", ReverseArgs::new());
    assert_eq!(lazy.to_string(), "/news/");

    app.pages().save(Page::new(1, "Latest", "latest")).unwrap();
    cycle_app_reverse_cache(app.generation().as_ref());
    assert_eq!(lazy.to_string(), "/latest/");
    assert_eq!(lazy.force().unwrap(), "/latest/");
}

// ═════════════════════════════════════════════════════════════════════
// 5. Closest match edge cases
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_closest_match_none_without_bindings() {
    let app = app();
    assert!(app.bindings().closest_match("articles.urls", None).is_none());
}

#[test]
fn test_ambiguous_without_language_takes_lowest_id() {
    let app = app();
    app.pages().save(Page::new(1, "One", "one")).unwrap();
    app.pages().save(Page::new(2, "Two", "two")).unwrap();
    app.bindings()
        .save(ApplicationContentBinding::new(9, 1, "articles.urls"))
        .unwrap();
    app.bindings()
        .save(ApplicationContentBinding::new(3, 2, "articles.urls"))
        .unwrap();
    let found = app.bindings().closest_match("articles.urls", None).unwrap();
    assert_eq!(found.binding.id, 3);
    assert_eq!(detail(&app, "x").unwrap(), "/two/x/");
}

// ═════════════════════════════════════════════════════════════════════
// 6. Prefix normalisation
// ═════════════════════════════════════════════════════════════════════

#[test]
fn test_override_url_gets_exactly_one_trailing_slash() {
    let app = app();
    app.pages()
        .save(Page::new(1, "News", "news").override_url("/latest"))
        .unwrap();
    app.bindings()
        .save(ApplicationContentBinding::new(1, 1, "articles.urls"))
        .unwrap();
    assert_eq!(detail(&app, "x").unwrap(), "/latest/x/");

    app.pages()
        .save(Page::new(1, "News", "news").override_url("/latest/"))
        .unwrap();
    assert_eq!(detail(&app, "x").unwrap(), "/latest/x/");
}

// ═════════════════════════════════════════════════════════════════════
// 7. Fixture, canonical URLs and tags together
// ═════════════════════════════════════════════════════════════════════

const FIXTURE: &str = r#"{
    "pages": [
        {"id": 1, "title": "News", "slug": "news", "language": "en"},
        {"id": 2, "title": "Topics", "slug": "topics", "language": "en"}
    ],
    "bindings": [
        {"id": 1, "parent": 1, "urlconf_path": "articles.urls"},
        {"id": 2, "parent": 2, "urlconf_path": "articles.category.urls"}
    ],
    "categories": [{"id": 1, "title": "Sport", "slug": "sport"}],
    "articles": [
        {"id": 1, "title": "Match report", "slug": "match-report", "category_id": 1, "language": "en"},
        {"id": 2, "title": "Draft", "slug": "draft", "active": false}
    ]
}"#;

#[test]
fn test_fixture_canonical_urls_and_tags() {
    let app = app();
    Fixture::from_json_str(FIXTURE)
        .unwrap()
        .load_into(&app)
        .unwrap();
    assert!(app.check().is_empty());

    let article = app.articles().get_by_slug("match-report").unwrap();
    assert_eq!(
        app.reverser().canonical_url(&article).unwrap(),
        "/news/match-report/"
    );

    let mut ctx = Context::new();
    let html = app.article_tags().render("{% articles %}", &mut ctx).unwrap();
    assert!(html.contains(r#"<a href="/news/match-report/">Match report</a>"#));
    assert!(!html.contains("Draft"));

    let html = app
        .category_tags()
        .render("{% articlecategories %}", &mut ctx)
        .unwrap();
    assert!(html.contains(r#"<a href="/topics/sport/">Sport</a>"#));

    app.category_tags()
        .render("{% articles_with_categoryslug 'sport' as sport %}", &mut ctx)
        .unwrap();
    assert_eq!(ctx.get("sport.0.slug"), Some(&json!("match-report")));
}

#[test]
fn test_unsaved_article_reverses_by_slug() {
    let app = app();
    app.pages().save(Page::new(1, "News", "news")).unwrap();
    app.bindings()
        .save(ApplicationContentBinding::new(1, 1, "articles.urls"))
        .unwrap();
    let article = Article::new("Later", "later");
    assert_eq!(app.reverser().canonical_url(&article).unwrap(), "/news/later/");
}
