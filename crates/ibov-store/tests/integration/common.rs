use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use chrono::NaiveDate;
use testcontainers::core::{ContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

/// Rendered B3 page with five constituents and the usual footer rows.
pub const IBOV_DAY_HTML: &str = include_str!("../fixtures/ibov_day.html");

/// Same page shape with the body rows removed.
pub fn header_only_html() -> String {
    let start = IBOV_DAY_HTML.find("<tbody>").expect("fixture has tbody");
    let end = IBOV_DAY_HTML.find("</tfoot>").expect("fixture has tfoot");
    format!(
        "{}<tbody></tbody>{}",
        &IBOV_DAY_HTML[..start],
        &IBOV_DAY_HTML[end + "</tfoot>".len()..]
    )
}

pub fn capture_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 7, 18).unwrap()
}

pub const MINIO_USER: &str = "minioadmin";
pub const MINIO_PASSWORD: &str = "minioadmin";

/// Spins up a MinIO container and returns a path-style S3 client for it.
///
/// The `ContainerAsync` must be kept in scope for the test duration —
/// dropping it will stop the container.
pub async fn setup_minio() -> (Client, ContainerAsync<GenericImage>) {
    let container = GenericImage::new("minio/minio", "latest")
        .with_exposed_port(ContainerPort::Tcp(9000))
        .with_wait_for(WaitFor::message_on_stdout("API:"))
        .with_env_var("MINIO_ROOT_USER", MINIO_USER)
        .with_env_var("MINIO_ROOT_PASSWORD", MINIO_PASSWORD)
        .with_cmd(["server", "/data"])
        .start()
        .await
        .expect("Failed to start MinIO container");

    let host = container.get_host().await.expect("Failed to get host");
    let port = container
        .get_host_port_ipv4(9000)
        .await
        .expect("Failed to get port");

    let config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(Credentials::new(
            MINIO_USER,
            MINIO_PASSWORD,
            None,
            None,
            "minio",
        ))
        .endpoint_url(format!("http://{host}:{port}"))
        .force_path_style(true)
        .build();

    (Client::from_conf(config), container)
}
