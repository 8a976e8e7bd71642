use movies_core::{derive_slug, Movie, MovieValidationError};
use std::collections::BTreeSet;
use uuid::Uuid;

#[test]
fn movie_new_derives_slug_and_sorts_genres() {
    let movie = Movie::new("Inception", 2010, ["Sci-Fi", "Action", "Sci-Fi"]);

    assert!(!movie.id.is_nil());
    assert_eq!(movie.slug, "inception-2010");
    assert_eq!(
        movie.genres.iter().map(String::as_str).collect::<Vec<_>>(),
        vec!["Action", "Sci-Fi"]
    );
    assert!(movie.validate().is_ok());
}

#[test]
fn with_id_rejects_nil_uuid() {
    let err = Movie::with_id(Uuid::nil(), "Nobody", 2000, ["Drama"]).unwrap_err();
    assert_eq!(err, MovieValidationError::NilId);
}

#[test]
fn refresh_slug_follows_title_and_year() {
    let mut movie = Movie::new("Heat", 1995, ["Crime"]);
    movie.title = "Heat: Director's Definitive Edition".to_string();
    movie.year_of_release = 2022;
    movie.refresh_slug();

    assert_eq!(movie.slug, "heat-directors-definitive-edition-2022");
    assert_eq!(movie.slug, derive_slug(&movie.title, movie.year_of_release));
}

#[test]
fn validate_rejects_blank_title() {
    let mut movie = Movie::new("Placeholder", 2000, ["Drama"]);
    movie.title = "   ".to_string();
    assert_eq!(movie.validate(), Err(MovieValidationError::EmptyTitle));
}

#[test]
fn validate_rejects_non_positive_year_before_slug_shape() {
    let movie = Movie::new("Foo", -5, ["Drama"]);
    assert_eq!(movie.slug, "foo--5");
    assert_eq!(movie.validate(), Err(MovieValidationError::InvalidYear(-5)));

    let movie = Movie::new("Foo", 0, ["Drama"]);
    assert_eq!(movie.validate(), Err(MovieValidationError::InvalidYear(0)));

    assert!(Movie::new("Foo", 1, ["Drama"]).validate().is_ok());
}

#[test]
fn validate_rejects_non_url_safe_slug() {
    let mut movie = Movie::new("Placeholder", 2000, ["Drama"]);
    movie.slug = "Not A Slug".to_string();
    assert_eq!(
        movie.validate(),
        Err(MovieValidationError::InvalidSlug("Not A Slug".to_string()))
    );

    movie.slug = String::new();
    assert!(matches!(
        movie.validate(),
        Err(MovieValidationError::InvalidSlug(_))
    ));
}

#[test]
fn validate_rejects_blank_or_comma_genres() {
    let blank = Movie::new("Placeholder", 2000, [" "]);
    assert_eq!(
        blank.validate(),
        Err(MovieValidationError::InvalidGenre(" ".to_string()))
    );

    let comma = Movie::new("Placeholder", 2000, ["Drama", "Sci,Fi"]);
    assert_eq!(
        comma.validate(),
        Err(MovieValidationError::InvalidGenre("Sci,Fi".to_string()))
    );
}

#[test]
fn movie_serialization_uses_expected_wire_fields() {
    let id = Uuid::parse_str("11111111-1111-4111-8111-111111111111").unwrap();
    let movie = Movie::with_id(id, "Inception", 2010, ["Sci-Fi", "Action"]).unwrap();

    let json = serde_json::to_value(&movie).unwrap();
    assert_eq!(json["id"], id.to_string());
    assert_eq!(json["title"], "Inception");
    assert_eq!(json["slug"], "inception-2010");
    assert_eq!(json["year_of_release"], 2010);
    assert_eq!(json["genres"], serde_json::json!(["Action", "Sci-Fi"]));

    let decoded: Movie = serde_json::from_value(json).unwrap();
    assert_eq!(decoded, movie);
}

#[test]
fn missing_genres_field_deserializes_as_empty_set() {
    let json = serde_json::json!({
        "id": "11111111-1111-4111-8111-111111111111",
        "title": "Untagged",
        "slug": "untagged-2020",
        "year_of_release": 2020
    });
    let movie: Movie = serde_json::from_value(json).unwrap();
    assert_eq!(movie.genres, BTreeSet::new());
}
