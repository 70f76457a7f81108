use chrono::{DateTime, Local, NaiveTime, TimeZone, Utc};
use marketplace_errors::{MarketplaceError, MarketplaceResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_LIMIT: i64 = 10;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// 分页请求
///
/// 缺失或非正数的页码/每页数量会回落到默认值，每页数量上限为 [`MAX_PAGE_LIMIT`]。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        let page = page.filter(|p| *p > 0).unwrap_or(DEFAULT_PAGE);
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT);
        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

pub fn total_pages(total_results: i64, limit: i64) -> i64 {
    if limit > 0 {
        (total_results + limit - 1) / limit
    } else {
        0
    }
}

/// 分页结果信封
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub total_results: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_results: i64, request: PageRequest) -> Self {
        Self {
            items,
            page: request.page,
            limit: request.limit,
            total_pages: total_pages(total_results, request.limit),
            total_results,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// 允许排序的任务字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Name,
    Price,
    Quantity,
    Status,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Name => "name",
            SortField::Price => "price",
            SortField::Quantity => "quantity",
            SortField::Status => "status",
        }
    }

    fn parse(name: &str) -> MarketplaceResult<Self> {
        match name {
            "createdAt" => Ok(SortField::CreatedAt),
            "updatedAt" => Ok(SortField::UpdatedAt),
            "name" => Ok(SortField::Name),
            "price" => Ok(SortField::Price),
            "quantity" => Ok(SortField::Quantity),
            "status" => Ok(SortField::Status),
            _ => Err(MarketplaceError::validation_error(format!(
                "sortBy: unsupported field '{name}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn newest_first() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }

    /// 解析 `createdAt:desc,name:asc` 形式的排序参数，方向缺省为升序
    pub fn parse_list(input: &str) -> MarketplaceResult<Vec<SortSpec>> {
        let mut specs = Vec::new();
        for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (field, direction) = match part.split_once(':') {
                Some((field, dir)) => (field.trim(), dir.trim()),
                None => (part, "asc"),
            };
            let direction = match direction.to_lowercase().as_str() {
                "asc" => SortDirection::Asc,
                "desc" => SortDirection::Desc,
                other => {
                    return Err(MarketplaceError::validation_error(format!(
                        "sortBy: unsupported direction '{other}'"
                    )))
                }
            };
            specs.push(SortSpec {
                field: SortField::parse(field)?,
                direction,
            });
        }
        if specs.is_empty() {
            specs.push(SortSpec::newest_first());
        }
        Ok(specs)
    }
}

/// 列表查询选项，默认按创建时间倒序、每页10条
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOptions {
    pub sort: Vec<SortSpec>,
    pub page: PageRequest,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            sort: vec![SortSpec::newest_first()],
            page: PageRequest::default(),
        }
    }
}

/// 调用方提供的选项，覆盖默认值
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptionsOverride {
    pub sort_by: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl QueryOptions {
    pub fn merge(overrides: &QueryOptionsOverride) -> MarketplaceResult<Self> {
        let defaults = Self::default();
        let sort = match &overrides.sort_by {
            Some(sort_by) => SortSpec::parse_list(sort_by)?,
            None => defaults.sort,
        };
        Ok(Self {
            sort,
            page: PageRequest::new(
                overrides.page.or(Some(defaults.page.page)),
                overrides.limit.or(Some(defaults.page.limit)),
            ),
        })
    }
}

/// 首页任务流的时间范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeFeed {
    /// 今天零点（本地时间）之后创建的任务
    Today,
    /// 今天零点之前创建的任务
    Others,
    All,
}

impl HomeFeed {
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("today") => HomeFeed::Today,
            Some("others") => HomeFeed::Others,
            _ => HomeFeed::All,
        }
    }
}

/// 给定时刻所在本地日期的零点，转换为UTC
pub fn local_midnight(now: DateTime<Local>) -> DateTime<Utc> {
    let naive = now.date_naive().and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        // 零点不存在（夏令时跳变）时退回到当前时刻所在日期的UTC零点
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults() {
        let req = PageRequest::new(None, None);
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 10);
        assert_eq!(req.offset(), 0);

        let req = PageRequest::new(Some(0), Some(-5));
        assert_eq!(req.page, 1);
        assert_eq!(req.limit, 10);

        let req = PageRequest::new(Some(3), Some(1000));
        assert_eq!(req.limit, MAX_PAGE_LIMIT);
        assert_eq!(req.offset(), 200);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(10, 3), 4);
        assert_eq!(total_pages(5, 0), 0);
    }

    #[test]
    fn test_page_envelope_serialization() {
        let page = Page::new(vec!["a", "b"], 5, PageRequest::new(Some(1), Some(2)));
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["totalResults"], 5);
        assert_eq!(json["limit"], 2);
        assert_eq!(json["items"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_sort_parse() {
        let specs = SortSpec::parse_list("createdAt:desc, name").unwrap();
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0], SortSpec::newest_first());
        assert_eq!(specs[1].field, SortField::Name);
        assert_eq!(specs[1].direction, SortDirection::Asc);

        assert_eq!(SortSpec::parse_list("").unwrap(), vec![SortSpec::newest_first()]);
        assert!(SortSpec::parse_list("password:asc").is_err());
        assert!(SortSpec::parse_list("name:sideways").is_err());
    }

    #[test]
    fn test_query_options_merge() {
        let merged = QueryOptions::merge(&QueryOptionsOverride::default()).unwrap();
        assert_eq!(merged, QueryOptions::default());

        let merged = QueryOptions::merge(&QueryOptionsOverride {
            sort_by: Some("price:asc".to_string()),
            page: Some(2),
            limit: None,
        })
        .unwrap();
        assert_eq!(merged.sort[0].field, SortField::Price);
        assert_eq!(merged.page.page, 2);
        assert_eq!(merged.page.limit, 10);
    }

    #[test]
    fn test_home_feed_param() {
        assert_eq!(HomeFeed::from_param(Some("today")), HomeFeed::Today);
        assert_eq!(HomeFeed::from_param(Some("others")), HomeFeed::Others);
        assert_eq!(HomeFeed::from_param(Some("all")), HomeFeed::All);
        assert_eq!(HomeFeed::from_param(None), HomeFeed::All);
    }

    #[test]
    fn test_local_midnight_is_not_after_now() {
        let now = Local::now();
        let midnight = local_midnight(now);
        assert!(midnight <= now.with_timezone(&Utc));
        assert!(now.with_timezone(&Utc) - midnight < chrono::Duration::hours(25));
    }
}
