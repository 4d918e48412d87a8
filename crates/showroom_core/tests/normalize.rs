use showroom_core::{is_valid_catalog_url, normalize_url, partition_urls, ScrapeKind};

#[test]
fn absolute_url_passes_through_unchanged() {
    let input = "https://labirintdoors.ru/katalog/royal";
    assert_eq!(normalize_url(ScrapeKind::Labirint, input), input);
}

#[test]
fn normalization_is_idempotent() {
    let once = normalize_url(ScrapeKind::Labirint, "royal");
    let twice = normalize_url(ScrapeKind::Labirint, &once);
    assert_eq!(once, "https://labirintdoors.ru/katalog/royal");
    assert_eq!(once, twice);
}

#[test]
fn bare_slug_gets_origin_and_catalog_prefix() {
    assert_eq!(
        normalize_url(ScrapeKind::Labirint, "royal"),
        "https://labirintdoors.ru/katalog/royal"
    );
    assert_eq!(
        normalize_url(ScrapeKind::Intecron, "sparta_2"),
        "https://intecron-msk.ru/catalog/sparta_2"
    );
}

#[test]
fn bare_path_gets_origin_only() {
    assert_eq!(
        normalize_url(ScrapeKind::Labirint, "/katalog/royal/royal-4"),
        "https://labirintdoors.ru/katalog/royal/royal-4"
    );
}

#[test]
fn surrounding_whitespace_is_trimmed() {
    assert_eq!(
        normalize_url(ScrapeKind::Labirint, "  royal \n"),
        "https://labirintdoors.ru/katalog/royal"
    );
}

#[test]
fn hyphenated_bare_input_is_not_expanded() {
    // "not-a-url" must stay invalid instead of becoming a plausible
    // catalog address.
    assert_eq!(normalize_url(ScrapeKind::Labirint, "not-a-url"), "not-a-url");
    assert!(!is_valid_catalog_url(ScrapeKind::Labirint, "not-a-url"));
}

#[test]
fn validity_requires_kind_host_and_prefix() {
    assert!(is_valid_catalog_url(
        ScrapeKind::Labirint,
        "https://labirintdoors.ru/katalog/royal"
    ));
    // Wrong host for the kind.
    assert!(!is_valid_catalog_url(
        ScrapeKind::Labirint,
        "https://intecron-msk.ru/catalog/sparta"
    ));
    // Right host, wrong section.
    assert!(!is_valid_catalog_url(
        ScrapeKind::Labirint,
        "https://labirintdoors.ru/news/opening"
    ));
    // Prefix alone, nothing after it.
    assert!(!is_valid_catalog_url(
        ScrapeKind::Labirint,
        "https://labirintdoors.ru/katalog/"
    ));
    assert!(!is_valid_catalog_url(
        ScrapeKind::Labirint,
        "ftp://labirintdoors.ru/katalog/royal"
    ));
}

#[test]
fn partition_keeps_valid_subset_and_reports_the_rest() {
    let inputs = vec![
        "https://labirintdoors.ru/katalog/royal".to_string(),
        "not-a-url".to_string(),
    ];
    let partition = partition_urls(ScrapeKind::Labirint, &inputs);
    assert_eq!(
        partition.valid,
        vec!["https://labirintdoors.ru/katalog/royal".to_string()]
    );
    assert_eq!(partition.invalid, vec!["not-a-url".to_string()]);
}

#[test]
fn partition_skips_blank_lines_and_normalizes_slugs() {
    let inputs = vec![
        "royal".to_string(),
        "   ".to_string(),
        "/katalog/loft".to_string(),
        "https://example.com/katalog/x".to_string(),
    ];
    let partition = partition_urls(ScrapeKind::Labirint, &inputs);
    assert_eq!(
        partition.valid,
        vec![
            "https://labirintdoors.ru/katalog/royal".to_string(),
            "https://labirintdoors.ru/katalog/loft".to_string(),
        ]
    );
    assert_eq!(
        partition.invalid,
        vec!["https://example.com/katalog/x".to_string()]
    );
}
