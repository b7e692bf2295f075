//! Picks the "related" posts listed under an article.

use crate::post::Post;
use crate::tag::TagIndex;
use std::sync::Arc;

/// The most related posts returned.
pub const MAX_RELATED: usize = 3;

/// Returns up to [`MAX_RELATED`] posts sharing a tag with `current`. Tags are
/// visited in `current`'s order and each tag's posts in index order. The
/// current, previous and next posts are never included, and no post is
/// included twice.
pub fn related(
    current: &Post,
    tags: &TagIndex,
    prev: Option<&Post>,
    next: Option<&Post>,
) -> Vec<Arc<Post>> {
    let excluded = |post: &Post| {
        post.slug == current.slug
            || prev.is_some_and(|p| p.slug == post.slug)
            || next.is_some_and(|n| n.slug == post.slug)
    };

    let mut found: Vec<Arc<Post>> = Vec::with_capacity(MAX_RELATED);
    for tag in &current.tags {
        for post in tags.get(tag).unwrap_or_default() {
            if found.len() == MAX_RELATED {
                return found;
            }
            if !excluded(post) && !found.iter().any(|f| f.slug == post.slug) {
                found.push(Arc::clone(post));
            }
        }
    }
    found
}

#[cfg(test)]
mod test {
    use super::*;

    /// Each entry is a slug and its space-separated tags.
    fn posts(entries: &[(&str, &str)]) -> Vec<Arc<Post>> {
        entries
            .iter()
            .map(|(slug, tags)| {
                Arc::new(Post {
                    slug: slug.to_string(),
                    tags: tags.split_whitespace().map(str::to_owned).collect(),
                    ..Post::default()
                })
            })
            .collect()
    }

    fn slugs(posts: &[Arc<Post>]) -> Vec<&str> {
        posts.iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn test_post_without_tags() {
        let posts = posts(&[("test", "")]);
        let tags = TagIndex::from_posts(&posts);
        assert!(related(&posts[0], &tags, None, None).is_empty());
    }

    #[test]
    fn test_three_posts_with_matching_tag() {
        let posts = posts(&[
            ("test", "js"),
            ("other", "js other"),
            ("other2", "js other"),
            ("other3", "other"),
            ("other4", "js other"),
        ]);
        let tags = TagIndex::from_posts(&posts);
        let found = related(&posts[0], &tags, None, None);
        assert_eq!(vec!["other", "other2", "other4"], slugs(&found));
    }

    #[test]
    fn test_ignores_prev_and_next() {
        let posts = posts(&[
            ("other", "js"),
            ("test", "js"),
            ("other2", "js"),
            ("other3", "js"),
            ("other4", "js"),
            ("other5", "js"),
        ]);
        let tags = TagIndex::from_posts(&posts);
        let found = related(&posts[1], &tags, Some(&*posts[0]), Some(&*posts[2]));
        assert_eq!(vec!["other3", "other4", "other5"], slugs(&found));
    }

    #[test]
    fn test_many_matching_tags() {
        let posts = posts(&[
            ("test", "js other third"),
            ("other", "js other"),
            ("other2", "fourth"),
            ("other3", "third"),
            ("other4", "js other"),
        ]);
        let tags = TagIndex::from_posts(&posts);
        let found = related(&posts[0], &tags, None, None);
        assert_eq!(vec!["other", "other4", "other3"], slugs(&found));
    }

    #[test]
    fn test_no_posts_with_matching_tag() {
        let posts = posts(&[
            ("test", "js"),
            ("other", "other"),
            ("other2", "other"),
            ("other3", "other"),
            ("other4", "other"),
        ]);
        let tags = TagIndex::from_posts(&posts);
        assert!(related(&posts[0], &tags, None, None).is_empty());
    }
}
