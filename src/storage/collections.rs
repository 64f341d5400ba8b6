use super::types::Article;
use std::collections::HashSet;
use std::sync::Arc;

/// An insertion-ordered set of articles keyed by URL.
///
/// Backs the saved and favorite lists. Contents live for the process
/// lifetime only.
#[derive(Debug, Default, Clone)]
pub struct ArticleCollection {
    articles: Vec<Article>,
    urls: HashSet<Arc<str>>,
}

impl ArticleCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an article. Returns false if an article with the same URL is
    /// already present (the stored copy is kept).
    pub fn add(&mut self, article: Article) -> bool {
        if !self.urls.insert(Arc::clone(&article.url)) {
            return false;
        }
        self.articles.push(article);
        true
    }

    /// Removes the article with this URL. Returns false if it was not present.
    pub fn remove(&mut self, url: &str) -> bool {
        if !self.urls.remove(url) {
            return false;
        }
        self.articles.retain(|a| &*a.url != url);
        true
    }

    pub fn has(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Articles in the order they were added.
    pub fn list(&self) -> &[Article] {
        &self.articles
    }

    /// Adds the article if absent, removes it otherwise. Returns true if the
    /// article is in the collection afterwards.
    pub fn toggle(&mut self, article: &Article) -> bool {
        if self.remove(&article.url) {
            false
        } else {
            self.add(article.clone())
        }
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// The user's saved and favorite articles for this session.
///
/// Owned by the application and passed explicitly to whatever needs it.
#[derive(Debug, Default)]
pub struct Library {
    pub saved: ArticleCollection,
    pub favorites: ArticleCollection,
}

impl Library {
    pub fn new() -> Self {
        Self::default()
    }
}
