use crate::database::MongoDB;
use crate::models::{Chart, ChartResponse, CreateChartRequest, File};
use crate::services::{auth_service, file_service};
use crate::services::auth_service::Claims;
use crate::utils::error::AppError;
use futures::stream::StreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use std::collections::HashMap;

/// Creates a chart against an existing file. Authorization is checked
/// against the FILE's owner, since the chart does not exist yet.
pub async fn create_chart(
    db: &MongoDB,
    claims: &Claims,
    request: &CreateChartRequest,
) -> Result<ChartResponse, AppError> {
    let file = file_service::find_file(db, &request.file_id).await?;
    auth_service::assert_owner_or_admin(claims, &file.user, "create chart for this file")?;

    if request.title.trim().is_empty()
        || request.x_axis.trim().is_empty()
        || request.y_axis.trim().is_empty()
    {
        return Err(AppError::Validation("Please add all fields".to_string()));
    }

    let owner = ObjectId::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthenticated("Invalid token subject".to_string()))?;
    let file_ref = file
        .id
        .ok_or_else(|| AppError::Internal("Loaded file has no id".to_string()))?;

    let mut chart = Chart {
        id: None,
        user: owner,
        file: file_ref,
        title: request.title.clone(),
        chart_type: request.chart_type,
        x_axis: request.x_axis.clone(),
        y_axis: request.y_axis.clone(),
        created_at: Some(BsonDateTime::now()),
    };

    let collection = db.collection::<Chart>("charts");
    let result = collection.insert_one(&chart).await?;
    chart.id = result.inserted_id.as_object_id();

    log::info!(
        "📊 Chart created: '{}' on file {} by user {}",
        chart.title,
        request.file_id,
        claims.sub
    );

    Ok(ChartResponse::from_chart(chart, Some(file.original_name)))
}

/// Caller's charts, newest first, each joined with the referenced file's
/// display name.
pub async fn list_charts(db: &MongoDB, claims: &Claims) -> Result<Vec<ChartResponse>, AppError> {
    let owner = ObjectId::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthenticated("Invalid token subject".to_string()))?;

    let collection = db.collection::<Chart>("charts");
    let mut cursor = collection
        .find(doc! { "user": owner })
        .sort(doc! { "createdAt": -1 })
        .await?;

    let mut charts = Vec::new();
    while let Some(result) = cursor.next().await {
        charts.push(result?);
    }

    let names = file_names_for(db, &charts).await?;
    Ok(charts
        .into_iter()
        .map(|chart| {
            let name = names.get(&chart.file).cloned();
            ChartResponse::from_chart(chart, name)
        })
        .collect())
}

/// Reads one chart; authorization is checked against the CHART's owner.
pub async fn get_chart(
    db: &MongoDB,
    claims: &Claims,
    chart_id: &str,
) -> Result<ChartResponse, AppError> {
    let chart = find_chart(db, chart_id).await?;
    auth_service::assert_owner_or_admin(claims, &chart.user, "access this chart")?;

    let names = file_names_for(db, std::slice::from_ref(&chart)).await?;
    let name = names.get(&chart.file).cloned();
    Ok(ChartResponse::from_chart(chart, name))
}

/// Deletes a chart. The referenced file is untouched.
pub async fn delete_chart(db: &MongoDB, claims: &Claims, chart_id: &str) -> Result<(), AppError> {
    let chart = find_chart(db, chart_id).await?;
    auth_service::assert_owner_or_admin(claims, &chart.user, "delete this chart")?;

    let collection = db.collection::<Chart>("charts");
    collection.delete_one(doc! { "_id": chart.id }).await?;

    log::info!("🗑️ Chart deleted: {} by user {}", chart_id, claims.sub);
    Ok(())
}

async fn find_chart(db: &MongoDB, chart_id: &str) -> Result<Chart, AppError> {
    let object_id = ObjectId::parse_str(chart_id)
        .map_err(|_| AppError::Validation("Invalid chart ID".to_string()))?;

    let collection = db.collection::<Chart>("charts");
    collection
        .find_one(doc! { "_id": object_id })
        .await?
        .ok_or_else(|| AppError::NotFound("Chart not found".to_string()))
}

/// Display names of the files referenced by `charts`. Files deleted since
/// the charts were created are simply absent from the map.
async fn file_names_for(
    db: &MongoDB,
    charts: &[Chart],
) -> Result<HashMap<ObjectId, String>, AppError> {
    let ids: Vec<ObjectId> = charts.iter().map(|c| c.file).collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let collection = db.collection::<File>("files");
    let mut cursor = collection.find(doc! { "_id": { "$in": ids } }).await?;

    let mut names = HashMap::new();
    while let Some(result) = cursor.next().await {
        let file = result?;
        if let Some(id) = file.id {
            names.insert(id, file.original_name);
        }
    }
    Ok(names)
}
