//! Paging types for repository queries.

/// Sort direction for a page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// A sort criterion: one property and a direction.
///
/// The property is validated against the entity's column list by the
/// finder that executes the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    property: String,
    direction: Direction,
}

impl Sort {
    pub fn by(direction: Direction, property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction,
        }
    }

    pub fn property(&self) -> &str {
        &self.property
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Request for one page of results.
///
/// Page indices are 0-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    size: u32,
    sort: Option<Sort>,
}

impl PageRequest {
    /// Creates a request for page `page` with `size` elements per page.
    ///
    /// # Panics
    /// Panics if `size` is zero.
    pub fn of(page: u32, size: u32) -> Self {
        assert!(size > 0, "page size must be positive");
        Self {
            page,
            size,
            sort: None,
        }
    }

    /// Attaches a sort criterion.
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn sort(&self) -> Option<&Sort> {
        self.sort.as_ref()
    }

    /// The SQL `OFFSET` for this page.
    pub fn offset(&self) -> u32 {
        self.page * self.size
    }
}

/// One page of results plus the totals from a companion count query.
#[derive(Debug, Clone)]
pub struct Page<T> {
    content: Vec<T>,
    number: u32,
    size: u32,
    total_elements: u64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, request: &PageRequest, total_elements: u64) -> Self {
        Self {
            content,
            number: request.page(),
            size: request.size(),
            total_elements,
        }
    }

    /// The elements on this page, at most `size` of them.
    pub fn content(&self) -> &[T] {
        &self.content
    }

    pub fn into_content(self) -> Vec<T> {
        self.content
    }

    /// The 0-based index of this page.
    pub fn number(&self) -> u32 {
        self.number
    }

    /// The requested page size (not the content length).
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn total_elements(&self) -> u64 {
        self.total_elements
    }

    /// Total page count: ceil(total_elements / size).
    pub fn total_pages(&self) -> u64 {
        let size = u64::from(self.size);
        (self.total_elements + size - 1) / size
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.number) + 1 < self.total_pages()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }

    pub fn is_first(&self) -> bool {
        !self.has_previous()
    }

    pub fn is_last(&self) -> bool {
        !self.has_next()
    }

    /// Maps the content, keeping the paging metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_of_five_by_three() {
        let request = PageRequest::of(0, 3);
        let page = Page::new(vec![1, 2, 3], &request, 5);

        assert_eq!(page.total_pages(), 2);
        assert_eq!(page.number(), 0);
        assert_eq!(page.size(), 3);
        assert!(page.is_first());
        assert!(page.has_next());
        assert!(!page.is_last());
    }

    #[test]
    fn last_page_holds_the_remainder() {
        let request = PageRequest::of(1, 3);
        let page = Page::new(vec![4, 5], &request, 5);

        assert_eq!(page.content().len(), 2);
        assert!(page.is_last());
        assert!(page.has_previous());
        assert!(!page.has_next());
    }

    #[test]
    fn empty_result_has_no_pages() {
        let request = PageRequest::of(0, 3);
        let page = Page::<i32>::new(Vec::new(), &request, 0);

        assert_eq!(page.total_pages(), 0);
        assert!(page.is_first());
        assert!(page.is_last());
    }

    #[test]
    fn exact_division_has_no_phantom_page() {
        let request = PageRequest::of(1, 3);
        let page = Page::new(vec![4, 5, 6], &request, 6);

        assert_eq!(page.total_pages(), 2);
        assert!(page.is_last());
    }

    #[test]
    fn offset_is_page_times_size() {
        assert_eq!(PageRequest::of(0, 3).offset(), 0);
        assert_eq!(PageRequest::of(2, 3).offset(), 6);
    }

    #[test]
    fn map_preserves_paging_metadata() {
        let request = PageRequest::of(0, 2);
        let page = Page::new(vec![1, 2], &request, 5).map(|n| n * 10);

        assert_eq!(page.content(), &[10, 20]);
        assert_eq!(page.total_elements(), 5);
        assert_eq!(page.total_pages(), 3);
    }

    #[test]
    #[should_panic(expected = "page size must be positive")]
    fn zero_page_size_is_rejected() {
        PageRequest::of(0, 0);
    }
}
