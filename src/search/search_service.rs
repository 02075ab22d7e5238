use crate::error::{AppError, Result};
use crate::room::room_repository::RoomRepository;
use super::search_models::{contains_pattern, page_window, SearchResponse, SearchResult, PAGE_SIZE};

#[derive(Clone)]
pub struct SearchService {
    rooms: RoomRepository,
}

impl SearchService {
    pub fn new(rooms: RoomRepository) -> Self {
        Self { rooms }
    }

    /// Room name search. Only rooms that have not been deleted are matched.
    pub async fn search(&self, q: Option<&str>, page: Option<&str>) -> Result<SearchResponse> {
        let term = q
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::BadRequest("The 'q' parameter is required.".to_string()))?;

        let pattern = contains_pattern(term);
        let count = self.rooms.count_by_name(&pattern).await?;
        let window = page_window(page, count, PAGE_SIZE);

        let rooms = self
            .rooms
            .search_by_name(&pattern, PAGE_SIZE, window.offset(PAGE_SIZE))
            .await?;

        Ok(SearchResponse {
            results: rooms
                .into_iter()
                .map(|room| SearchResult {
                    id: room.id,
                    room_name: room.name,
                })
                .collect(),
            page: window.page,
            num_pages: window.num_pages,
            count,
        })
    }
}
