use api::App;
use db::{Database, Memory, NoTls, Store};
use hyper::{server::conn::http1, service::service_fn};
use hyper_util::rt::TokioIo;
use service::{Config, Consistency};
use std::{
    convert::Infallible,
    env,
    net::{Ipv4Addr, SocketAddr},
    pin::pin,
    sync::Arc,
};
use tokio::{net::TcpListener, runtime::Runtime};

/// Connects to PostgreSQL when `PG_HOSTNAME` is set. Otherwise, everything
/// lives in memory and is lost on shutdown.
async fn connect_store() -> anyhow::Result<Box<dyn Store>> {
    let host = match env::var("PG_HOSTNAME") {
        Ok(host) => host,
        _ => {
            log::warn!("PG_HOSTNAME is not set, so data will only be kept in memory");
            return Ok(Box::<Memory>::default());
        }
    };
    let user = env::var("PG_USERNAME")?;
    let pass = env::var("PG_PASSWORD")?;
    let data = env::var("PG_DATABASE")?;
    let port = match env::var("PG_PORT") {
        Ok(port) => port.parse()?,
        _ => 5432,
    };

    let (client, conn) = db::Config::new()
        .user(&user)
        .password(&pass)
        .host(&host)
        .dbname(&data)
        .port(port)
        .connect(NoTls)
        .await?;
    tokio::spawn(async move {
        if let Err(err) = conn.await {
            log::error!("database connection closed: {err}");
        }
    });

    let db = Database::from(client);
    db.migrate().await.map_err(|err| anyhow::anyhow!("cannot prepare the schema: {err}"))?;
    log::info!("connected to PostgreSQL at {host}:{port}/{data}");
    Ok(Box::new(db))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    // Parse environment variables
    let port = env::var("PORT")?.parse()?;
    let cascade_shared_questions = match env::var("CASCADE_SHARED_QUESTIONS") {
        Ok(flag) => flag.parse()?,
        _ => true,
    };
    let config = Config { cascade_shared_questions };
    if !cascade_shared_questions {
        log::info!("questions shared with other quizzes survive quiz deletion");
    }

    let runtime = Runtime::new()?;
    runtime.block_on(async move {
        let store = connect_store().await?;
        let app = Arc::new(App::from(Consistency::new(store, config)));

        let addr: SocketAddr = (Ipv4Addr::UNSPECIFIED, port).into();
        let listener = TcpListener::bind(addr).await?;
        log::info!("listening on {addr}");

        let mut stop = pin!(tokio::signal::ctrl_c());
        loop {
            let (stream, peer) = tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok(pair) => pair,
                    Err(err) => {
                        log::error!("cannot accept connection: {err}");
                        continue;
                    }
                },
                _ = &mut stop => break,
            };

            let outer = app.clone();
            tokio::spawn(async move {
                let service = service_fn(move |req| {
                    let inner = outer.clone();
                    async move { Ok::<_, Infallible>(inner.try_respond(req).await) }
                });
                if let Err(err) = http1::Builder::new().serve_connection(TokioIo::new(stream), service).await {
                    log::error!("connection with {peer} failed: {err}");
                }
            });
        }

        log::info!("shutting down");
        anyhow::Ok(())
    })
}
