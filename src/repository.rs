//! Member search repository
//!
//! Holds no state besides its executor and settings; every call builds its
//! queries from scratch, so one repository can serve many tasks at once.

use crate::composer;
use crate::condition::MemberSearchCondition;
use crate::dto::{MemberTeamDto, TeamStatistics};
use crate::errors::SearchError;
use config::SearchConfig;
use query_object::{Page, PageRequest, QueryExecutor, Record, UpdateSet};

pub struct MemberRepository<E> {
    executor: E,
    settings: SearchConfig,
}

impl<E: QueryExecutor> MemberRepository<E> {
    pub fn new(executor: E) -> Self {
        Self::with_config(executor, SearchConfig::default())
    }

    pub fn with_config(executor: E, settings: SearchConfig) -> Self {
        Self { executor, settings }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn settings(&self) -> &SearchConfig {
        &self.settings
    }

    /// Request for `page` at the configured default page size
    pub fn page_request(&self, page: i64) -> PageRequest {
        PageRequest::new(page, self.settings.default_page_size)
    }

    /// Every matching member, in member id order
    pub async fn search(
        &self,
        condition: &MemberSearchCondition,
    ) -> Result<Vec<MemberTeamDto>, SearchError> {
        let rows = self
            .executor
            .fetch_rows(&composer::search_query(condition))
            .await?;
        trace_log!("[search] {} rows for {:?}", rows.len(), condition);
        map_rows(rows, MemberTeamDto::from_record)
    }

    /// One page of matching members plus the total match count.
    ///
    /// When the settings allow it, the count query is skipped if the page
    /// itself proves the total (a short page is the last one).
    pub async fn search_page(
        &self,
        condition: &MemberSearchCondition,
        request: &PageRequest,
    ) -> Result<Page<MemberTeamDto>, SearchError> {
        self.fetch_page(condition, request, self.settings.count_short_circuit)
            .await
    }

    /// Like `search_page`, but always runs the count query
    pub async fn search_page_simple(
        &self,
        condition: &MemberSearchCondition,
        request: &PageRequest,
    ) -> Result<Page<MemberTeamDto>, SearchError> {
        self.fetch_page(condition, request, false).await
    }

    /// Member count and average age per team, by team name
    pub async fn team_statistics(
        &self,
        condition: &MemberSearchCondition,
    ) -> Result<Vec<TeamStatistics>, SearchError> {
        let rows = self
            .executor
            .fetch_rows(&composer::team_statistics_query(condition))
            .await?;
        map_rows(rows, TeamStatistics::from_record)
    }

    /// Apply `update_set` to every matching member; returns the number updated
    pub async fn bulk_update(
        &self,
        condition: &MemberSearchCondition,
        update_set: UpdateSet,
    ) -> Result<u64, SearchError> {
        let query = composer::bulk_target_query(condition).set(update_set);
        let updated = self.executor.execute_update(&query).await?;
        debug_log!("[bulk_update] {} members updated", updated);
        Ok(updated)
    }

    /// Delete every matching member; returns the number deleted
    pub async fn bulk_delete(&self, condition: &MemberSearchCondition) -> Result<u64, SearchError> {
        let query = composer::bulk_target_query(condition);
        let deleted = self.executor.execute_delete(&query).await?;
        debug_log!("[bulk_delete] {} members deleted", deleted);
        Ok(deleted)
    }

    async fn fetch_page(
        &self,
        condition: &MemberSearchCondition,
        request: &PageRequest,
        short_circuit: bool,
    ) -> Result<Page<MemberTeamDto>, SearchError> {
        self.check_request(request)?;

        let rows = self
            .executor
            .fetch_rows(&composer::content_query(condition, request)?)
            .await?;
        let content = map_rows(rows, MemberTeamDto::from_record)?;

        let proven_total = if short_circuit {
            request.total_from_content(content.len())
        } else {
            None
        };
        let total = match proven_total {
            Some(total) => {
                debug_log!(
                    "[search_page] count query skipped: page {} holds {} of {} rows",
                    request.page,
                    content.len(),
                    total
                );
                total
            }
            None => {
                self.executor
                    .fetch_count(&composer::count_query(condition))
                    .await?
            }
        };

        Ok(Page::new(content, request, total))
    }

    fn check_request(&self, request: &PageRequest) -> Result<(), SearchError> {
        if request.offset().is_none() || request.size > self.settings.max_page_size {
            return Err(SearchError::InvalidPageRequest {
                page: request.page,
                size: request.size,
            });
        }
        Ok(())
    }
}

fn map_rows<T>(
    rows: Vec<Record>,
    map: fn(Record) -> Result<T, serde_json::Error>,
) -> Result<Vec<T>, SearchError> {
    rows.into_iter()
        .map(|row| map(row).map_err(SearchError::from))
        .collect()
}
