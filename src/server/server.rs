use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::server::*;
use crate::settings::Settings;
use nanoid::nanoid;
use sqlx::{MySql, Pool};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub friend_query_service: Arc<dyn FriendQueryService>,
    pub friend_apply_service: Arc<dyn FriendApplyService>,
    pub friend_delete_service: Arc<dyn FriendDeleteService>,
    notice_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
    pool: Pool<MySql>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let run_id = nanoid!(10, &alphabet);

        let pool = Pool::<MySql>::connect(&settings.database.dsn).await?;
        let tx_manager: Arc<dyn TxManager> = Arc::new(MySqlTxManager::new(pool.clone()));

        let profile_repo: Arc<dyn ProfileRepo> = Arc::new(MySqlProfileRepo::new(pool.clone()));
        let friendship_repo: Arc<dyn FriendshipRepo> =
            Arc::new(MySqlFriendshipRepo::new(pool.clone()));
        let apply_repo: Arc<dyn ApplyRepo> = Arc::new(MySqlApplyRepo::new(pool.clone()));

        let cancel = CancellationToken::new();

        let (notice, notice_handle): (Arc<dyn NoticePort>, Option<JoinHandle<()>>) =
            match settings.notice.backend.as_str() {
                "fake" => (Arc::new(FakeNotice::new()), None),
                "kafka" => {
                    let publisher: Arc<dyn EventPublisher> = Arc::new(KafkaPublisher::new(
                        &settings.notice.brokers,
                        &format!("accord-pub-{}", run_id),
                    )?);
                    let (relay, worker) =
                        NoticeWorker::channel(publisher, &settings.notice.topic, cancel.clone());
                    let handle = tokio::spawn(async move {
                        let _ = worker.run().await;
                    });
                    (Arc::new(relay), Some(handle))
                }
                other => return Err(anyhow::anyhow!("Unknown notice backend: {}", other)),
            };

        let friend_service = Arc::new(RealFriendService::new(
            profile_repo,
            friendship_repo,
            apply_repo,
            notice,
            tx_manager,
        ));

        info!("server started");

        Ok(Self {
            friend_query_service: friend_service.clone(),
            friend_apply_service: friend_service.clone(),
            friend_delete_service: friend_service,
            notice_handle: Mutex::new(notice_handle),
            cancel,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = self.notice_handle.lock().ok().and_then(|mut lock| lock.take());
        if let Some(handle) = handle {
            let r = handle.await;
            info!("notice worker handle dropped: {:?}", r);
        }

        self.pool.close().await;
    }
}
