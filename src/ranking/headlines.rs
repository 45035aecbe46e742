//! Headline selection: manual tags, then computed ranking, then recency.

use serde::Serialize;

use crate::content::models::Article;
use crate::ranking::ArticleWithMetrics;

pub const MAX_SUB_HEADLINES: usize = 4;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Headlines {
    pub main: Option<Article>,
    pub subs: Vec<Article>,
}

/// First manually flagged main headline, otherwise the top-ranked article.
pub fn select_main<'a>(
    articles: &'a [Article],
    ranked: &'a [ArticleWithMetrics],
) -> Option<&'a Article> {
    articles
        .iter()
        .find(|a| a.data.is_main_headline)
        .or_else(|| ranked.first().map(|r| &r.article))
}

/// Up to [`MAX_SUB_HEADLINES`] articles, never including `main`.
///
/// Manually flagged sub headlines come first. Remaining slots are filled from
/// the ranking; when the ranking has no candidate besides `main`, they are
/// filled from the newest articles instead. The list may come back short.
pub fn select_subs(
    articles: &[Article],
    ranked: &[ArticleWithMetrics],
    main: Option<&Article>,
) -> Vec<Article> {
    let main_id = main.map(|m| m.id.as_str());
    let not_main = |a: &&Article| Some(a.id.as_str()) != main_id;

    let mut chosen: Vec<&Article> = articles
        .iter()
        .filter(|a| a.data.is_sub_headline)
        .filter(not_main)
        .take(MAX_SUB_HEADLINES)
        .collect();

    if chosen.len() < MAX_SUB_HEADLINES {
        let ranked_candidates: Vec<&Article> =
            ranked.iter().map(|r| &r.article).filter(not_main).collect();

        let fill: Vec<&Article> = if ranked_candidates.is_empty() {
            articles.iter().filter(not_main).collect()
        } else {
            ranked_candidates
        };

        for candidate in fill {
            if chosen.len() >= MAX_SUB_HEADLINES {
                break;
            }
            if !chosen.iter().any(|c| c.id == candidate.id) {
                chosen.push(candidate);
            }
        }
    }

    chosen.into_iter().cloned().collect()
}
