//! Defines the [`TagIndex`], which groups [`Post`]s by tag.

use crate::post::Post;
use std::collections::HashMap;
use std::sync::Arc;

/// A tag and the posts carrying it, in the order they were indexed.
#[derive(Clone, Debug)]
pub struct Tag {
    /// The tag as first written in frontmatter.
    pub name: String,

    /// The URL segment shared by every spelling of the tag (`Rust`, `rust`).
    pub slug: String,

    pub posts: Vec<Arc<Post>>,
}

/// Maps tags to the posts carrying them. Tags are keyed by slug, so
/// spellings that publish to the same URL share one entry and keep the
/// first-seen name. Tags iterate in the order they were first seen; each
/// tag's posts keep the order the posts were indexed in, so indexing
/// date-sorted posts yields date-sorted tags.
#[derive(Clone, Debug, Default)]
pub struct TagIndex {
    tags: Vec<Tag>,
    positions: HashMap<String, usize>,
}

impl TagIndex {
    /// Indexes `posts` in order. A post that lists the same tag twice is
    /// only indexed under it once.
    pub fn from_posts(posts: &[Arc<Post>]) -> TagIndex {
        let mut index = TagIndex::default();
        for post in posts {
            for name in &post.tags {
                index.insert(name, post);
            }
        }
        index
    }

    fn insert(&mut self, name: &str, post: &Arc<Post>) {
        let slug = slug::slugify(name);
        let position = match self.positions.get(&slug) {
            Some(&position) => position,
            None => {
                self.tags.push(Tag {
                    name: name.to_owned(),
                    slug: slug.clone(),
                    posts: Vec::new(),
                });
                self.positions.insert(slug, self.tags.len() - 1);
                self.tags.len() - 1
            }
        };
        let posts = &mut self.tags[position].posts;
        if !posts.last().is_some_and(|last| Arc::ptr_eq(last, post)) {
            posts.push(Arc::clone(post));
        }
    }

    /// Returns the posts tagged `name` under any spelling, or `None` for
    /// unknown tags.
    pub fn get(&self, name: &str) -> Option<&[Arc<Post>]> {
        self.positions
            .get(&slug::slugify(name))
            .map(|&position| self.tags[position].posts.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::NaiveDate;

    fn post(slug: &str, date: (i32, u32, u32), tags: &[&str]) -> Arc<Post> {
        Arc::new(Post {
            slug: slug.to_owned(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Post::default()
        })
    }

    fn slugs(posts: &[Arc<Post>]) -> Vec<&str> {
        posts.iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn test_tag_order_follows_sorted_posts() {
        let mut posts = vec![
            post("jan", (2023, 1, 1), &["x"]),
            post("jun", (2023, 6, 1), &["x"]),
            post("old", (2022, 1, 1), &["x"]),
        ];
        posts.sort_by(|a, b| b.date.cmp(&a.date));
        let index = TagIndex::from_posts(&posts);
        assert_eq!(Some(vec!["jun", "jan", "old"]), index.get("x").map(slugs));
    }

    #[test]
    fn test_every_tag_is_indexed_once_per_post() {
        let posts = vec![
            post("a", (2023, 1, 2), &["rust", "web", "rust"]),
            post("b", (2023, 1, 1), &["web"]),
        ];
        let index = TagIndex::from_posts(&posts);
        assert_eq!(2, index.len());
        assert_eq!(Some(vec!["a"]), index.get("rust").map(slugs));
        assert_eq!(Some(vec!["a", "b"]), index.get("web").map(slugs));
        assert!(index.get("nope").is_none());
        assert_eq!(
            vec!["rust", "web"],
            index.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
        );
    }

    #[test]
    fn test_spellings_share_a_tag() {
        let posts = vec![
            post("a", (2023, 1, 3), &["Rust"]),
            post("b", (2023, 1, 2), &["rust"]),
            post("c", (2023, 1, 1), &["RUST", "Rust"]),
        ];
        let index = TagIndex::from_posts(&posts);
        assert_eq!(1, index.len());
        let tag = index.iter().next().unwrap();
        assert_eq!("Rust", tag.name);
        assert_eq!("rust", tag.slug);
        assert_eq!(vec!["a", "b", "c"], slugs(&tag.posts));
        assert_eq!(Some(vec!["a", "b", "c"]), index.get("rust").map(slugs));
    }
}
