use crate::database::MongoDB;
use crate::services::auth_service::{self, Claims};
use crate::utils::error::AppError;
use futures::stream::StreamExt;
use mongodb::bson::{doc, from_document, oid::ObjectId, DateTime as BsonDateTime, Document};
use serde::{Deserialize, Serialize};

/// One row of the admin user listing, as produced by the aggregation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserCountsRow {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    email: String,
    #[serde(default)]
    is_admin: bool,
    created_at: Option<BsonDateTime>,
    file_count: i64,
    chart_count: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: Option<String>,
    pub file_count: i64,
    pub chart_count: i64,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub total_users: u64,
    pub total_files: u64,
    pub total_charts: u64,
    pub storage_used: i64,
}

/// Server-side join: every user with the counts of files and charts it
/// owns, newest first.
pub async fn users_with_counts(
    db: &MongoDB,
    claims: &Claims,
) -> Result<Vec<AdminUserResponse>, AppError> {
    auth_service::assert_admin(claims)?;

    let users = db.collection::<Document>("users");
    let mut cursor = users.aggregate(user_counts_pipeline()).await?;

    let mut rows = Vec::new();
    while let Some(result) = cursor.next().await {
        let row: UserCountsRow = from_document(result?)
            .map_err(|e| AppError::Internal(format!("Malformed aggregation row: {}", e)))?;
        rows.push(AdminUserResponse {
            id: row.id.to_hex(),
            name: row.name,
            email: row.email,
            is_admin: row.is_admin,
            created_at: row.created_at.and_then(|d| d.try_to_rfc3339_string().ok()),
            file_count: row.file_count,
            chart_count: row.chart_count,
        });
    }
    Ok(rows)
}

/// Global totals. `storage_used` is a full scan over File sizes; no
/// running counter is maintained.
pub async fn global_stats(db: &MongoDB, claims: &Claims) -> Result<StatsResponse, AppError> {
    auth_service::assert_admin(claims)?;

    let total_users = db
        .collection::<Document>("users")
        .count_documents(doc! {})
        .await?;
    let total_files = db
        .collection::<Document>("files")
        .count_documents(doc! {})
        .await?;
    let total_charts = db
        .collection::<Document>("charts")
        .count_documents(doc! {})
        .await?;

    #[derive(Deserialize)]
    struct SizeOnly {
        #[serde(default)]
        size: i64,
    }

    let files = db.collection::<SizeOnly>("files");
    let mut cursor = files
        .find(doc! {})
        .projection(doc! { "size": 1 })
        .await?;

    let mut storage_used: i64 = 0;
    while let Some(result) = cursor.next().await {
        storage_used += result?.size;
    }

    Ok(StatsResponse {
        total_users,
        total_files,
        total_charts,
        storage_used,
    })
}

fn user_counts_pipeline() -> Vec<Document> {
    vec![
        doc! {
            "$lookup": {
                "from": "files",
                "localField": "_id",
                "foreignField": "user",
                "as": "files",
            }
        },
        doc! {
            "$lookup": {
                "from": "charts",
                "localField": "_id",
                "foreignField": "user",
                "as": "charts",
            }
        },
        doc! {
            "$project": {
                "_id": 1,
                "name": 1,
                "email": 1,
                "isAdmin": 1,
                "createdAt": 1,
                "fileCount": { "$size": "$files" },
                "chartCount": { "$size": "$charts" },
            }
        },
        doc! {
            "$sort": { "createdAt": -1 }
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pipeline_joins_counts_and_sorts_newest_first() {
        let pipeline = user_counts_pipeline();
        assert_eq!(pipeline.len(), 4);

        let lookup = pipeline[0].get_document("$lookup").unwrap();
        assert_eq!(lookup.get_str("from").unwrap(), "files");
        assert_eq!(lookup.get_str("foreignField").unwrap(), "user");

        let project = pipeline[2].get_document("$project").unwrap();
        assert!(project.get_document("fileCount").is_ok());
        assert!(project.get_document("chartCount").is_ok());

        let sort = pipeline[3].get_document("$sort").unwrap();
        assert_eq!(sort.get_i32("createdAt").unwrap(), -1);
    }

    #[tokio::test]
    #[ignore] // Requires MongoDB to be running
    async fn stats_sum_matches_inserted_sizes() {
        dotenv::dotenv().ok();
        let uri = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017/SheetAnalyticsTest".to_string());
        let db = MongoDB::new(&uri).await.expect("MongoDB connection");

        let files = db.collection::<Document>("files");
        files.delete_many(doc! {}).await.unwrap();
        for size in [100i64, 200, 300] {
            files
                .insert_one(doc! { "user": ObjectId::new(), "size": size })
                .await
                .unwrap();
        }

        let admin_claims = Claims {
            sub: ObjectId::new().to_hex(),
            email: "admin@example.com".to_string(),
            name: "Admin".to_string(),
            is_admin: true,
            iat: 0,
            exp: usize::MAX,
            jti: "test".to_string(),
            aud: String::new(),
            iss: String::new(),
        };

        let stats = global_stats(&db, &admin_claims).await.unwrap();
        assert_eq!(stats.total_files, 3);
        assert_eq!(stats.storage_used, 600);
    }
}
