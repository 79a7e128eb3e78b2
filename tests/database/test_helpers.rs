use lazy_static::lazy_static;
use std::sync::Arc;
use testcontainers::{clients::Cli, Container};
use testcontainers_modules::postgres::Postgres;
use tokio_postgres::{Client, NoTls};

pub struct TestDatabase {
    pub connection_string: String,
    _container: Container<'static, Postgres>
}

impl TestDatabase {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        lazy_static! {
            static ref DOCKER: Arc<Cli> = Arc::new(Cli::default());
        }

        let container = DOCKER.run(Postgres::default());
        let port = container.get_host_port_ipv4(5432);

        let connection_string = format!(
            "host=localhost port={} user=postgres password=postgres dbname=postgres",
            port
        );

        let client = connect(&connection_string).await?;
        client.batch_execute(include_str!("schema.sql")).await?;

        Ok(TestDatabase {
            connection_string,
            _container: container
        })
    }

    pub async fn get_client(&self) -> Result<Client, Box<dyn std::error::Error>> {
        connect(&self.connection_string).await
    }

    /// Two queued players, the first never scored, and one unqueued player.
    pub async fn seed_players(&self) -> Result<(), Box<dyn std::error::Error>> {
        let client = self.get_client().await?;
        client
            .batch_execute(
                "INSERT INTO algo_players (riot_puuid, points_count, is_queued, updated_at) VALUES
                 ('fresh', 0, TRUE, NULL),
                 ('veteran', 7.5, TRUE, '2024-01-01 00:00:00'),
                 ('idle', 6.1, FALSE, '2024-01-01 00:00:00')"
            )
            .await?;

        Ok(())
    }

    pub async fn count(&self, table: &str) -> Result<i64, Box<dyn std::error::Error>> {
        let client = self.get_client().await?;
        let row = client.query_one(&format!("SELECT COUNT(*) FROM {}", table), &[]).await?;

        Ok(row.get(0))
    }
}

async fn connect(connection_string: &str) -> Result<Client, Box<dyn std::error::Error>> {
    let (client, connection) = tokio_postgres::connect(connection_string, NoTls).await?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            eprintln!("Database connection error: {}", e);
        }
    });

    Ok(client)
}
