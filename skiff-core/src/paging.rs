use crate::{Error, Result};

/// Which page of a result set to read.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PagingOptions {
    /// No paging, rejected by every paging operation.
    #[default]
    None,
    ForPage {
        page: u32,
        results_per_page: u32,
    },
}

impl PagingOptions {
    /// Page `page` (1 based) of `results_per_page` rows.
    pub fn for_page(page: u32, results_per_page: u32) -> Result<Self> {
        if page < 1 {
            return Err(Error::argument("page", "The page number must be at least 1"));
        }
        if results_per_page < 1 {
            return Err(Error::argument(
                "results_per_page",
                "The results per page must be at least 1",
            ));
        }
        Ok(Self::ForPage {
            page,
            results_per_page,
        })
    }

    /// Skip `skip` rows and take the next `take`.
    pub fn skip_take(skip: u32, take: u32) -> Result<Self> {
        if take < 1 {
            return Err(Error::argument("take", "At least one row must be taken"));
        }
        if skip % take != 0 {
            return Err(Error::argument(
                "skip",
                "The rows skipped must be a multiple of the rows taken",
            ));
        }
        Self::for_page(skip / take + 1, take)
    }

    /// Fails with an argument error naming `paging` unless a page of at least one row is selected.
    ///
    /// Values built through the variant directly skip the checks of [`PagingOptions::for_page`].
    pub fn validate(&self) -> Result<()> {
        match self {
            PagingOptions::None => Err(Error::argument(
                "paging",
                "Paging requires a page, not PagingOptions::None",
            )),
            PagingOptions::ForPage { page: 0, .. } => Err(Error::argument(
                "paging",
                "The page number must be at least 1",
            )),
            PagingOptions::ForPage {
                results_per_page: 0,
                ..
            } => Err(Error::argument(
                "paging",
                "The results per page must be at least 1",
            )),
            PagingOptions::ForPage { .. } => Ok(()),
        }
    }

    pub fn is_none(&self) -> bool {
        *self == PagingOptions::None
    }

    pub fn page(&self) -> u32 {
        match self {
            PagingOptions::None => 0,
            PagingOptions::ForPage { page, .. } => *page,
        }
    }

    /// Rows skipped before the page starts.
    pub fn offset(&self) -> u64 {
        match self {
            PagingOptions::None => 0,
            PagingOptions::ForPage {
                page,
                results_per_page,
            } => (*page as u64).saturating_sub(1) * *results_per_page as u64,
        }
    }

    /// Rows in a page.
    pub fn count(&self) -> u64 {
        match self {
            PagingOptions::None => 0,
            PagingOptions::ForPage {
                results_per_page, ..
            } => *results_per_page as u64,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult<T> {
    page: u32,
    results: Vec<T>,
    results_per_page: u32,
    total_results: u64,
}

impl<T> PagedResult<T> {
    pub fn new(page: u32, results: Vec<T>, results_per_page: u32, total_results: u64) -> Self {
        Self {
            page,
            results,
            results_per_page,
            total_results,
        }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn results(&self) -> &[T] {
        &self.results
    }

    pub fn into_results(self) -> Vec<T> {
        self.results
    }

    pub fn results_per_page(&self) -> u32 {
        self.results_per_page
    }

    pub fn total_results(&self) -> u64 {
        self.total_results
    }

    pub fn total_pages(&self) -> u64 {
        if self.results_per_page == 0 {
            return 0;
        }
        self.total_results.div_ceil(self.results_per_page as u64)
    }

    pub fn has_results(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn more_results_available(&self) -> bool {
        (self.page as u64) < self.total_pages()
    }
}
