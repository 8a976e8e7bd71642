//! Fixed catalog rows inserted at startup when absent.

pub(crate) struct SeedMovie {
    pub id: &'static str,
    pub title: &'static str,
    pub slug: &'static str,
    pub year_of_release: i32,
    pub genres: &'static [&'static str],
}

pub(crate) const SEED_MOVIES: &[SeedMovie] = &[
    SeedMovie {
        id: "0e2aeb82-8e2c-4ccf-9d79-87bf8a8a82c4",
        title: "The Godfather",
        slug: "the-godfather-1972",
        year_of_release: 1972,
        genres: &["Crime", "Drama"],
    },
    SeedMovie {
        id: "76a3c8f8-98f1-4a3e-bb27-3340dcf2c5a3",
        title: "The Shawshank Redemption",
        slug: "the-shawshank-redemption-1994",
        year_of_release: 1994,
        genres: &["Drama", "Crime"],
    },
    SeedMovie {
        id: "dc5b5c08-9d2b-4668-87a7-79bc72e4966c",
        title: "The Dark Knight",
        slug: "the-dark-knight-2008",
        year_of_release: 2008,
        genres: &["Action", "Crime", "Drama"],
    },
    SeedMovie {
        id: "5c45d5b5-5f05-4a90-8c5c-57af6d259c6f",
        title: "Forrest Gump",
        slug: "forrest-gump-1994",
        year_of_release: 1994,
        genres: &["Drama", "Romance"],
    },
    SeedMovie {
        id: "31549f9d-ba98-4ecf-a8e4-606c0eef04c4",
        title: "The Lord of the Rings: The Fellowship of the Ring",
        slug: "the-lord-of-the-rings-the-fellowship-of-the-ring-2001",
        year_of_release: 2001,
        genres: &["Adventure", "Drama", "Fantasy"],
    },
    SeedMovie {
        id: "89c4c9d9-739a-4a16-ae1b-3d955ae1fbf2",
        title: "Star Wars: Episode IV - A New Hope",
        slug: "star-wars-episode-iv-a-new-hope-1977",
        year_of_release: 1977,
        genres: &["Action", "Adventure", "Sci-Fi"],
    },
    SeedMovie {
        id: "61b6d21c-8b43-436c-b89d-f66d773f6e8b",
        title: "Pulp Fiction",
        slug: "pulp-fiction-1994",
        year_of_release: 1994,
        genres: &["Crime", "Drama"],
    },
    SeedMovie {
        id: "3d68b6c1-6ed8-4e99-a3e3-f19b92d49705",
        title: "The Matrix",
        slug: "the-matrix-1999",
        year_of_release: 1999,
        genres: &["Action", "Sci-Fi"],
    },
    SeedMovie {
        id: "c15eeb5a-1f70-4eb4-93df-c4e11d42ad13",
        title: "Goodfellas",
        slug: "goodfellas-1990",
        year_of_release: 1990,
        genres: &["Biography", "Crime", "Drama"],
    },
    SeedMovie {
        id: "0504b4a4-dede-4d4e-bbaa-7f4653cb61da",
        title: "The Silence of the Lambs",
        slug: "the-silence-of-the-lambs-1991",
        year_of_release: 1991,
        genres: &["Crime", "Drama", "Thriller"],
    },
];
