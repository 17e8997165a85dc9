use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// The five supported visualization types. Anything else fails request
/// deserialization before a handler runs.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, utoipa::ToSchema)]
pub enum ChartType {
    #[serde(rename = "2d-bar")]
    Bar2d,
    #[serde(rename = "2d-line")]
    Line2d,
    #[serde(rename = "2d-pie")]
    Pie2d,
    #[serde(rename = "2d-scatter")]
    Scatter2d,
    #[serde(rename = "3d-column")]
    Column3d,
}

/// Saved chart configuration (stored in the `charts` collection).
///
/// `file` is a non-owning reference: deleting the referenced File leaves the
/// chart in place with a dangling reference.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user: ObjectId,
    pub file: ObjectId,
    pub title: String,
    pub chart_type: ChartType,
    pub x_axis: String,
    pub y_axis: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<BsonDateTime>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChartRequest {
    pub file_id: String,
    pub title: String,
    pub chart_type: ChartType,
    pub x_axis: String,
    pub y_axis: String,
}

/// Referenced file surface in chart responses: id plus display name, the
/// shape produced by populating the reference with its `originalName`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartFileRef {
    #[serde(rename = "_id")]
    pub id: String,
    pub original_name: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub user: String,
    pub file: ChartFileRef,
    pub title: String,
    pub chart_type: ChartType,
    pub x_axis: String,
    pub y_axis: String,
    pub created_at: Option<String>,
}

impl ChartResponse {
    /// Joins a chart with its referenced file's display name. `None` means
    /// the file has since been deleted (the reference is preserved).
    pub fn from_chart(chart: Chart, file_name: Option<String>) -> Self {
        ChartResponse {
            id: chart.id.map(|id| id.to_hex()).unwrap_or_default(),
            user: chart.user.to_hex(),
            file: ChartFileRef {
                id: chart.file.to_hex(),
                original_name: file_name,
            },
            title: chart.title,
            chart_type: chart.chart_type,
            x_axis: chart.x_axis,
            y_axis: chart.y_axis,
            created_at: chart
                .created_at
                .and_then(|d| d.try_to_rfc3339_string().ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chart_type_accepts_only_the_five_known_values() {
        for value in ["2d-bar", "2d-line", "2d-pie", "2d-scatter", "3d-column"] {
            let parsed: ChartType =
                serde_json::from_str(&format!("\"{}\"", value)).expect(value);
            assert_eq!(serde_json::to_string(&parsed).unwrap(), format!("\"{}\"", value));
        }

        assert!(serde_json::from_str::<ChartType>("\"2d-donut\"").is_err());
        assert!(serde_json::from_str::<ChartType>("\"bar\"").is_err());
    }
}
