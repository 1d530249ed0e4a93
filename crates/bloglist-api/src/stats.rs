//! Aggregates over an in-memory list of blogs.
//!
//! Ties go to the author encountered first when scanning in list order. An
//! author only takes the lead with a strictly positive total, so an empty
//! list (or, for likes, a list where nothing has been liked) yields no author.

use std::collections::HashMap;

use bloglist_types::api::{AuthorBlogCount, AuthorLikes, BlogStatsResponse};
use bloglist_types::models::Blog;

pub fn total_likes(blogs: &[Blog]) -> u64 {
    blogs.iter().map(|b| b.likes).sum()
}

pub fn most_blogs(blogs: &[Blog]) -> AuthorBlogCount {
    let (author, count) = leader(blogs, |_| 1);
    AuthorBlogCount { author, count }
}

pub fn most_likes(blogs: &[Blog]) -> AuthorLikes {
    let (author, likes) = leader(blogs, |b| b.likes);
    AuthorLikes { author, likes }
}

pub fn summarize(blogs: &[Blog]) -> BlogStatsResponse {
    BlogStatsResponse {
        total_likes: total_likes(blogs),
        most_blogs: most_blogs(blogs),
        most_likes: most_likes(blogs),
    }
}

/// Sum `weight` per author and return the author with the largest sum.
fn leader(blogs: &[Blog], weight: impl Fn(&Blog) -> u64) -> (Option<String>, u64) {
    // Totals kept in first-seen order so the scan below breaks ties correctly
    let mut totals: Vec<(&str, u64)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for blog in blogs {
        let i = *index.entry(blog.author.as_str()).or_insert_with(|| {
            totals.push((blog.author.as_str(), 0));
            totals.len() - 1
        });
        totals[i].1 += weight(blog);
    }

    totals
        .into_iter()
        .fold((None, 0), |(best, max), (author, total)| {
            if total > max {
                (Some(author.to_string()), total)
            } else {
                (best, max)
            }
        })
}
