use std::fmt;

use crate::models::LabelType;

/// Per-category retrieval counts for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummaryReport {
    pub stock_data: usize,
    pub stock_news: usize,
    pub sector_data: usize,
    pub sector_news: usize,
    pub total_stocks: usize,
    pub total_sectors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Category {
    pub name: &'static str,
    pub title: &'static str,
    pub retrieved: usize,
    pub total: usize,
}

impl Category {
    pub fn is_complete(&self) -> bool {
        self.retrieved >= self.total
    }
}

impl SummaryReport {
    pub fn new(total_stocks: usize, total_sectors: usize) -> Self {
        Self {
            total_stocks,
            total_sectors,
            ..Self::default()
        }
    }

    fn total(&self, label_type: LabelType) -> usize {
        match label_type {
            LabelType::Stock => self.total_stocks,
            LabelType::Sector => self.total_sectors,
        }
    }

    /// Count one price series; returns the new count. Capped at the total.
    pub fn record_data(&mut self, label_type: LabelType) -> usize {
        let total = self.total(label_type);
        let counter = match label_type {
            LabelType::Stock => &mut self.stock_data,
            LabelType::Sector => &mut self.sector_data,
        };
        *counter = (*counter + 1).min(total);
        *counter
    }

    /// Count one news batch; returns the new count. Capped at the total.
    pub fn record_news(&mut self, label_type: LabelType) -> usize {
        let total = self.total(label_type);
        let counter = match label_type {
            LabelType::Stock => &mut self.stock_news,
            LabelType::Sector => &mut self.sector_news,
        };
        *counter = (*counter + 1).min(total);
        *counter
    }

    pub fn categories(&self) -> [Category; 4] {
        [
            Category {
                name: "stock data",
                title: "Stock Data",
                retrieved: self.stock_data,
                total: self.total_stocks,
            },
            Category {
                name: "stock news",
                title: "Stock News",
                retrieved: self.stock_news,
                total: self.total_stocks,
            },
            Category {
                name: "sector data",
                title: "Sector Data",
                retrieved: self.sector_data,
                total: self.total_sectors,
            },
            Category {
                name: "sector news",
                title: "Sector News",
                retrieved: self.sector_news,
                total: self.total_sectors,
            },
        ]
    }

    pub fn all_succeeded(&self) -> bool {
        self.categories().iter().all(Category::is_complete)
    }

    /// Short categories, in report order.
    pub fn missing(&self) -> Vec<&'static str> {
        self.categories()
            .iter()
            .filter(|c| !c.is_complete())
            .map(|c| c.name)
            .collect()
    }

    pub fn log_summary(&self) {
        tracing::info!(
            stock_data = format!("{}/{}", self.stock_data, self.total_stocks),
            stock_news = format!("{}/{}", self.stock_news, self.total_stocks),
            sector_data = format!("{}/{}", self.sector_data, self.total_sectors),
            sector_news = format!("{}/{}", self.sector_news, self.total_sectors),
            all_succeeded = self.all_succeeded(),
            "Retrieval finished"
        );
    }
}

impl fmt::Display for SummaryReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary of Data Retrieval:")?;
        for c in self.categories() {
            writeln!(f, "{} Retrieved: {}/{}", c.title, c.retrieved, c.total)?;
        }
        if self.all_succeeded() {
            write!(f, "All data retrieved successfully.")
        } else {
            write!(f, "Missing: {}", self.missing().join(", "))
        }
    }
}
