use bevy::{
    asset::{AssetLoader, LoadContext, io::Reader},
    reflect::TypePath,
};
use bevy_reactive_character_core::{errors::ProfileError, profile::ReactiveProfile};

#[derive(Default, TypePath)]
pub struct ReactiveProfileLoader;

impl AssetLoader for ReactiveProfileLoader {
    type Asset = ReactiveProfile;
    type Settings = ();
    type Error = ProfileError;

    async fn load(
        &self,
        reader: &mut dyn Reader,
        _settings: &Self::Settings,
        _load_context: &mut LoadContext<'_>,
    ) -> Result<Self::Asset, Self::Error> {
        let mut bytes = vec![];
        reader.read_to_end(&mut bytes).await?;
        let profile: ReactiveProfile = ron::de::from_bytes(&bytes)?;

        Ok(profile)
    }

    fn extensions(&self) -> &[&str] {
        &["reactive.ron"]
    }
}
